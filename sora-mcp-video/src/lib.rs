//! Sora MCP Video Server Library
//!
//! This library exposes the OpenAI Sora video API as MCP tools: create, remix,
//! status, list, download-link, save and delete.

pub mod client;
pub mod handler;
pub mod resources;
pub mod server;
pub mod storage;

pub use client::{ContentVariant, ListOrder, SoraClient, VideoJob};
pub use handler::{
    CreateVideoParams, DownloadLinkParams, DownloadLinkResult, ListVideosParams, RemixVideoParams,
    SaveVideoParams, SaveVideoResult, VideoHandler, VideoIdParams,
};
pub use server::SoraServer;
