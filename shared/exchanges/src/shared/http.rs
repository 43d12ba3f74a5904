use crate::structs::ExchangeConfig;
use reqwest::{
    header::{self, HeaderMap, HeaderValue},
    Client, Proxy, Response,
};
use serde::de::DeserializeOwned;
use serde_json::from_str;
use std::time::Duration;
use tickflow_error::TickflowError;

const HTTP_TIMEOUT: Duration = Duration::from_secs(15);

pub fn build_http_client(config: &ExchangeConfig) -> Result<Client, TickflowError> {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));

    let mut builder = Client::builder()
        .default_headers(headers)
        .gzip(true)
        .timeout(HTTP_TIMEOUT);

    if let Some(proxy_config) = &config.proxy {
        let mut proxy = Proxy::all(&proxy_config.url)?;
        if let Some(auth_header) = &proxy_config.auth_header {
            let value = HeaderValue::from_str(auth_header).map_err(|error| {
                TickflowError::new_invalid_payload(format!("invalid proxy auth header: {}", error))
            })?;
            proxy = proxy.custom_http_auth(value);
        }
        builder = builder.proxy(proxy);
    }

    Ok(builder.build()?)
}

pub async fn try_parse_response<T: DeserializeOwned>(
    response: Response,
) -> Result<T, TickflowError> {
    let status = response.status();
    let response_text = response.text().await?;
    if !status.is_success() {
        let description = format!("status {}: {}", status, response_text);
        return Err(TickflowError::new_unsuccessful_response(description));
    }
    let parsed_response = from_str::<T>(&response_text)?;
    Ok(parsed_response)
}
