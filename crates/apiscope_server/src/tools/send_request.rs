use super::SEND_API_REQUEST;
use crate::http::{ApiRequest, HttpClient};
use apiscope_tools::{CallContext, Tool, must_tool};

pub(super) fn tool(client: HttpClient) -> impl Tool {
    must_tool(
        SEND_API_REQUEST,
        format!(
            "{SEND_API_REQUEST} will send one HTTP request and return the status, headers and \
             body. Transport failures are retried up to maxRetries times."
        ),
        move |ctx: CallContext, request: ApiRequest| {
            let client = client.clone();
            async move { client.send(&ctx, &request).await }
        },
    )
}
