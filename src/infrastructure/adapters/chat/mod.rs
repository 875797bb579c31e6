//! Chat Adapters

mod serenity_chat;

pub use serenity_chat::SerenityChat;
