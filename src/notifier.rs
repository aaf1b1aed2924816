#[cfg(test)]
use std::sync::{Arc, Mutex};
#[cfg(feature = "whatsapp")]
use std::time::Duration;

#[cfg(feature = "whatsapp")]
use zeroize::Zeroizing;

use crate::models::PaymentNotice;
use crate::settings::Settings;

/// Addresses starting with this are already routable and are sent as given.
pub const CHANNEL_PREFIX: &str = "whatsapp:";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationOutcome {
    Sent,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMessage {
    pub to: String,
    pub body: String,
}

pub fn normalize_phone(phone: &str, prefix: &str) -> String {
    if phone.starts_with(CHANNEL_PREFIX) {
        return phone.to_string();
    }
    format!("{prefix}{}", phone.trim())
}

pub fn compose_message(school_name: &str, notice: &PaymentNotice) -> String {
    format!(
        "\u{2705} *Payment Received - {school_name}* \u{2705}\n\n\
         Dear Parent,\n\n\
         We have received \u{20b9}{amount} for *{name}* (Class: {std}).\n\
         Thank you for your timely payment.\n\n\
         Regards,\n{school_name} \u{1f3eb}",
        amount = notice.amount,
        name = notice.student_name,
        std = notice.standard,
    )
}

// ---------------------------------------------------------------------------
// Channels: enum dispatch instead of trait objects
// ---------------------------------------------------------------------------

enum Channel {
    #[cfg(feature = "whatsapp")]
    WhatsApp(WhatsAppClient),
    /// Writes the message to the log instead of delivering it.
    Log,
    #[cfg(test)]
    Recording(Arc<Mutex<Vec<OutgoingMessage>>>),
    /// Rejects every message with the given reason.
    #[cfg(test)]
    Failing(String),
}

impl Channel {
    fn name(&self) -> &'static str {
        match self {
            #[cfg(feature = "whatsapp")]
            Self::WhatsApp(_) => "whatsapp",
            Self::Log => "log",
            #[cfg(test)]
            Self::Recording(_) => "recording",
            #[cfg(test)]
            Self::Failing(_) => "failing",
        }
    }

    fn deliver(&self, message: &OutgoingMessage) -> Result<(), String> {
        match self {
            #[cfg(feature = "whatsapp")]
            Self::WhatsApp(client) => client.send(message),
            Self::Log => {
                tracing::info!(to = %message.to, body = %message.body, "notification (log only)");
                Ok(())
            }
            #[cfg(test)]
            Self::Recording(sent) => {
                sent.lock().map_err(|e| e.to_string())?.push(message.clone());
                Ok(())
            }
            #[cfg(test)]
            Self::Failing(reason) => Err(reason.clone()),
        }
    }
}

#[cfg(feature = "whatsapp")]
fn default_channel(settings: &Settings) -> Channel {
    Channel::WhatsApp(WhatsAppClient::from_env(settings))
}

#[cfg(not(feature = "whatsapp"))]
fn default_channel(_settings: &Settings) -> Channel {
    Channel::Log
}

/// Sends payment confirmations to guardians. Delivery is best-effort: one
/// attempt, and the outcome is reported, never raised.
pub struct Notifier {
    channel: Channel,
    school_name: String,
    phone_prefix: String,
}

impl Notifier {
    pub fn from_settings(settings: &Settings) -> Self {
        if std::env::var("FEEBOOK_NOTIFY").is_ok_and(|v| v == "log") {
            return Self::log_only(settings);
        }
        Self::with_channel(default_channel(settings), settings)
    }

    pub fn log_only(settings: &Settings) -> Self {
        Self::with_channel(Channel::Log, settings)
    }

    fn with_channel(channel: Channel, settings: &Settings) -> Self {
        Self {
            channel,
            school_name: settings.school_name.clone(),
            phone_prefix: settings.phone_prefix.clone(),
        }
    }

    #[cfg(test)]
    pub(crate) fn recording(settings: &Settings) -> (Self, Arc<Mutex<Vec<OutgoingMessage>>>) {
        let sent = Arc::new(Mutex::new(Vec::new()));
        (
            Self::with_channel(Channel::Recording(Arc::clone(&sent)), settings),
            sent,
        )
    }

    #[cfg(test)]
    pub(crate) fn failing(settings: &Settings, reason: &str) -> Self {
        Self::with_channel(Channel::Failing(reason.to_string()), settings)
    }

    pub fn channel_name(&self) -> &'static str {
        self.channel.name()
    }

    pub fn notify(&self, notice: &PaymentNotice) -> NotificationOutcome {
        let message = OutgoingMessage {
            to: normalize_phone(&notice.phone, &self.phone_prefix),
            body: compose_message(&self.school_name, notice),
        };
        match self.channel.deliver(&message) {
            Ok(()) => {
                tracing::info!(to = %message.to, channel = self.channel.name(), "payment confirmation sent");
                NotificationOutcome::Sent
            }
            Err(reason) => {
                tracing::warn!(to = %message.to, channel = self.channel.name(), %reason, "failed to send payment confirmation");
                NotificationOutcome::Failed(reason)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Twilio WhatsApp client (feature-gated)
// ---------------------------------------------------------------------------

#[cfg(feature = "whatsapp")]
struct WhatsAppClient {
    account_sid: String,
    auth_token: Zeroizing<String>,
    from: String,
    api_base: String,
    timeout: Option<Duration>,
}

#[cfg(feature = "whatsapp")]
impl WhatsAppClient {
    fn from_env(settings: &Settings) -> Self {
        Self {
            account_sid: std::env::var("TWILIO_ACCOUNT_SID").unwrap_or_default(),
            auth_token: Zeroizing::new(std::env::var("TWILIO_AUTH_TOKEN").unwrap_or_default()),
            from: std::env::var("TWILIO_WHATSAPP_NUMBER").unwrap_or_default(),
            api_base: settings.messaging_api_base.clone(),
            timeout: settings.notify_timeout_secs.map(Duration::from_secs),
        }
    }

    fn send(&self, message: &OutgoingMessage) -> Result<(), String> {
        if self.account_sid.is_empty() || self.auth_token.is_empty() {
            return Err("messaging credentials are not configured".to_string());
        }
        let url = format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.api_base.trim_end_matches('/'),
            self.account_sid
        );
        let client = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| e.to_string())?;
        let response = client
            .post(&url)
            .basic_auth(&self.account_sid, Some(self.auth_token.as_str()))
            .form(&[
                ("To", message.to.as_str()),
                ("From", self.from.as_str()),
                ("Body", message.body.as_str()),
            ])
            .send()
            .map_err(|e| e.to_string())?;
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            let detail = response.text().unwrap_or_default();
            Err(format!("messaging API returned {status}: {detail}"))
        }
    }
}
