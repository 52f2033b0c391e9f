#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Message rejected ({code}): {description}")]
    Rejected { code: i64, description: String },

    #[error("Messaging channel closed")]
    ChannelClosed,
}
