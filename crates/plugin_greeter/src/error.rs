//! Error types for the greeter

use std::{io::Error as IoError, path::PathBuf};
use thiserror::Error;

use crate::types::PlayerId;

/// Known-players file errors
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Failed to read known players from {0}: {1}")]
    FileRead(PathBuf, IoError),

    #[error("Failed to write known players to {0}: {1}")]
    FileWrite(PathBuf, IoError),

    #[error("Failed to create directory {0}: {1}")]
    CreateDirectory(PathBuf, IoError),
}

/// Greeter configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {0}: {1}")]
    Read(PathBuf, IoError),

    #[error("Failed to write config {0}: {1}")]
    Write(PathBuf, IoError),

    #[error("Failed to create directory {0}: {1}")]
    CreateDirectory(PathBuf, IoError),

    #[error("Malformed config {0}: {1}")]
    Parse(PathBuf, serde_json::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(serde_json::Error),
}

/// Message delivery errors
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("Player {0} is no longer reachable")]
    PlayerUnreachable(PlayerId),

    #[error("Transport error: {0}")]
    Transport(String),
}

/// Umbrella error for the plugin API
#[derive(Debug, Error)]
pub enum GreeterError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

pub type GreeterResult<T> = Result<T, GreeterError>;
pub type RegistryResult<T> = Result<T, RegistryError>;
pub type ConfigResult<T> = Result<T, ConfigError>;
