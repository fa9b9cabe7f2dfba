mod settings;

pub use settings::{
    DeliveryConfig, DeliveryMode, GroupSettings, ServerConfig, Settings, TelegramConfig,
};
