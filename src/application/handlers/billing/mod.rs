mod process_webhook;

pub use process_webhook::{ProcessWebhookCommand, ProcessWebhookHandler};
