//! Request routing: matches method + path, hands off to the data service,
//! and shapes every outcome into an API Gateway response with fixed CORS
//! headers and a JSON body.

use lambda_http::{http::Method, Body, Error, Request, RequestExt, Response};
use serde_json::{json, Map, Value};

use crate::service::{ServiceError, UserService};
use crate::store::UserStore;

const RESOURCE_PATH: &str = "/user";

pub async fn handle<S: UserStore>(
    service: &UserService<S>,
    event: Request,
) -> Result<Response<Body>, Error> {
    log::info!("received {} {}", event.method(), event.uri().path());
    let result = dispatch(service, &event).await;
    match result {
        Ok(response) => Ok(response),
        Err(err) => {
            log::error!("dispatch failed: {err}");
            respond(500, &json!({"error": "Internal server error"}))
        }
    }
}

async fn dispatch<S: UserStore>(
    service: &UserService<S>,
    event: &Request,
) -> Result<Response<Body>, Error> {
    let path = event.uri().path();
    match *event.method() {
        Method::POST if path.contains(RESOURCE_PATH) => create(service, event).await,
        Method::GET if path.contains(RESOURCE_PATH) => fetch(service, event).await,
        Method::OPTIONS => respond(200, &json!({"message": "CORS preflight"})),
        _ => respond(405, &json!({"error": "Method not allowed"})),
    }
}

async fn create<S: UserStore>(
    service: &UserService<S>,
    event: &Request,
) -> Result<Response<Body>, Error> {
    let raw: &[u8] = event.body();
    if raw.is_empty() {
        return respond(400, &json!({"error": "Request body is required"}));
    }
    let Ok(data) = serde_json::from_slice::<Map<String, Value>>(raw) else {
        return respond(400, &json!({"error": "Invalid JSON in request body"}));
    };
    match service.create_user(data).await {
        Ok(user_id) => respond(
            201,
            &json!({"message": "User created successfully", "userId": user_id}),
        ),
        Err(err) => error_response(&err),
    }
}

async fn fetch<S: UserStore>(
    service: &UserService<S>,
    event: &Request,
) -> Result<Response<Body>, Error> {
    let user_id = event
        .query_string_parameters_ref()
        .and_then(|params| params.first("userId"))
        .unwrap_or_default();
    if user_id.is_empty() {
        return respond(400, &json!({"error": "UserId parameter is required"}));
    }
    match service.fetch_user(user_id).await {
        Ok(user) => respond(200, &serde_json::to_value(&user)?),
        Err(err) => error_response(&err),
    }
}

fn error_response(err: &ServiceError) -> Result<Response<Body>, Error> {
    let status = match err {
        ServiceError::MissingFields(_) | ServiceError::MissingUserId => 400,
        ServiceError::AlreadyExists(_) => 409,
        ServiceError::NotFound(_) => 404,
        // store detail stays in the logs, never in the response
        ServiceError::Store(detail) => {
            log::error!("{detail}");
            return respond(500, &json!({"error": "Internal server error"}));
        }
    };
    respond(status, &json!({"error": err.to_string()}))
}

fn respond(status: u16, body: &Value) -> Result<Response<Body>, Error> {
    let response = Response::builder()
        .status(status)
        .header("Access-Control-Allow-Headers", "*")
        .header("Access-Control-Allow-Origin", "*")
        .header("Access-Control-Allow-Methods", "OPTIONS,POST,GET")
        .header("Content-Type", "application/json")
        .body(Body::Text(body.to_string()))
        .map_err(Box::new)?;
    Ok(response)
}
