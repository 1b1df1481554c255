//! The `track` command: shipment lookup against the courier backend.

use {
    async_trait::async_trait,
    serde::Deserialize,
    tracing::warn,
    weft_common::{keys, CommandArgs, Response},
    weft_platform::PlatformClient,
};

use crate::command::Command;

const MSG_NO_DETAILS: &str = "Can't get tracking details from the courier";
const MSG_EMPTY_NUMBER: &str = "Tracking number can't be empty";

/// Waybill lookup result as returned by the courier API.
#[derive(Debug, Clone, Deserialize)]
pub struct TrackingResult {
    pub waybill_number: String,
    #[serde(default)]
    pub sender: Option<String>,
    #[serde(default)]
    pub sender_address: Option<String>,
    #[serde(default)]
    pub send_date: Option<String>,
    #[serde(default)]
    pub delivered: bool,
    #[serde(default)]
    pub pod_receiver: Option<String>,
    #[serde(default)]
    pub pod_receiver_time: Option<String>,
    #[serde(default)]
    pub last_status: Option<LastStatus>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LastStatus {
    #[serde(default)]
    pub date_time: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub receiver_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TrackingEnvelope {
    result: Option<TrackingResult>,
}

/// Thin reqwest client for the courier's waybill endpoint.
#[derive(Clone)]
pub struct TrackingClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl TrackingClient {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            api_key,
        }
    }

    pub async fn lookup(
        &self,
        waybill: &str,
    ) -> Result<Option<TrackingResult>, reqwest::Error> {
        let mut request = self
            .http
            .get(format!("{}/customer/waybill", self.base_url))
            .query(&[("waybill", waybill)]);
        if let Some(key) = &self.api_key {
            request = request.header("api-key", key);
        }

        let envelope: TrackingEnvelope = request.send().await?.json().await?;
        Ok(envelope.result)
    }
}

pub struct TrackCommand {
    client: TrackingClient,
}

impl TrackCommand {
    pub fn new(client: TrackingClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Command for TrackCommand {
    /// Waybill details are for the invoking user only.
    fn is_private(&self, _args: &CommandArgs) -> bool {
        true
    }

    async fn execute(
        &self,
        _client: &dyn PlatformClient,
        args: &CommandArgs,
    ) -> weft_common::Result<Response> {
        let waybill = match args.opt_str(keys::OPT_TRACKING_NUMBER) {
            Ok(Some(number)) if !number.trim().is_empty() => number,
            _ => return Ok(Response::text(MSG_EMPTY_NUMBER)),
        };

        match self.client.lookup(waybill).await {
            Ok(Some(result)) => Ok(Response::text(format_summary(&result))),
            Ok(None) => Ok(Response::text(MSG_NO_DETAILS)),
            Err(err) => {
                warn!(waybill, error = %err, "waybill lookup failed");
                Ok(Response::text(MSG_NO_DETAILS))
            },
        }
    }
}

fn format_summary(result: &TrackingResult) -> String {
    let sender = result.sender.as_deref().unwrap_or("-");
    let sender_address = result.sender_address.as_deref().unwrap_or("-");
    let send_date = result.send_date.as_deref().unwrap_or("-");

    if result.delivered {
        let receiver = result.pod_receiver.as_deref().unwrap_or("-");
        let received_at = result.pod_receiver_time.as_deref().unwrap_or("-");
        return format!(
            "{}\nFrom {sender} - {sender_address} at {send_date} has been Delivered.\n\
             {receiver} : {received_at}",
            result.waybill_number
        );
    }

    let (when, whereabouts) = match &result.last_status {
        Some(status) => (
            status.date_time.as_deref().unwrap_or("-"),
            status
                .receiver_name
                .as_deref()
                .or(status.city.as_deref())
                .unwrap_or("-"),
        ),
        None => ("-", "-"),
    };
    format!(
        "{}\nFrom {sender} - {sender_address} at {send_date}\nCurrent status\n\
         {when}: {whereabouts}",
        result.waybill_number
    )
}
