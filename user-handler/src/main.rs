//! Lambda entry point for the user API: `POST /user` creates a user,
//! `GET /user?userId=...` fetches one, backed by a DynamoDB table keyed by
//! `userId`.

use lambda_http::{run, service_fn, Error};

mod handler;
mod service;
mod store;

use service::UserService;
use store::DynamoStore;

const TABLE_NAME_VAR: &str = "STORAGE_SITEUSERTABLE_NAME";
const DEFAULT_TABLE_NAME: &str = "siteUserTable";

#[tokio::main]
async fn main() -> Result<(), Error> {
    env_logger::init();
    let table_name =
        std::env::var(TABLE_NAME_VAR).unwrap_or_else(|_| DEFAULT_TABLE_NAME.to_owned());
    log::info!("serving user table {table_name}");
    // the client outlives individual invocations of a warm instance
    let config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    let store = DynamoStore::new(aws_sdk_dynamodb::Client::new(&config), table_name);
    let service = UserService::new(store);
    run(service_fn(|event| handler::handle(&service, event))).await
}
