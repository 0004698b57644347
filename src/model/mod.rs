//! Core data model: email bodies, MIME trees and chat-completion wire types.

pub mod body;
pub mod chat;
