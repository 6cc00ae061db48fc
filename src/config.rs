//! Construction-time pool configuration, loadable from `freelist.toml`

use crate::error::{FreeListError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const CONFIG_FILE_NAME: &str = "freelist.toml";

/// What an inactive allocation port does to the cascade mask
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InactivePortPolicy {
    /// The would-be pick still enters the mask, so later ports skip it
    Reserve,
    /// Only granted picks enter the mask
    Skip,
}

impl Default for InactivePortPolicy {
    fn default() -> Self {
        InactivePortPolicy::Reserve
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolConfig {
    #[serde(default = "default_width")]
    pub width: usize,

    #[serde(default = "default_false")]
    pub reserve_slot_zero: bool,

    #[serde(default = "default_ports")]
    pub alloc_ports: usize,

    #[serde(default = "default_ports")]
    pub dealloc_ports: usize,

    #[serde(default = "default_true")]
    pub enable_forwarding: bool,

    #[serde(default = "default_false")]
    pub enable_scan_chain: bool,

    #[serde(default)]
    pub inactive_ports: InactivePortPolicy,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            reserve_slot_zero: false,
            alloc_ports: default_ports(),
            dealloc_ports: default_ports(),
            enable_forwarding: true,
            enable_scan_chain: false,
            inactive_ports: InactivePortPolicy::Reserve,
        }
    }
}

fn default_true() -> bool { true }
fn default_false() -> bool { false }
fn default_width() -> usize { 64 }
fn default_ports() -> usize { 2 }

impl PoolConfig {
    pub fn new(width: usize) -> Self {
        Self { width, ..Self::default() }
    }

    pub fn with_reserved_zero(mut self, reserve: bool) -> Self {
        self.reserve_slot_zero = reserve;
        self
    }

    pub fn with_ports(mut self, alloc: usize, dealloc: usize) -> Self {
        self.alloc_ports = alloc;
        self.dealloc_ports = dealloc;
        self
    }

    pub fn with_forwarding(mut self, enabled: bool) -> Self {
        self.enable_forwarding = enabled;
        self
    }

    pub fn with_scan_chain(mut self, enabled: bool) -> Self {
        self.enable_scan_chain = enabled;
        self
    }

    pub fn with_inactive_ports(mut self, policy: InactivePortPolicy) -> Self {
        self.inactive_ports = policy;
        self
    }

    /// Number of slots the occupancy vector actually tracks
    pub fn trackable(&self) -> usize {
        self.width.saturating_sub(self.reserve_slot_zero as usize)
    }

    /// Reject pools that would track nothing
    pub fn validate(&self) -> Result<()> {
        if self.trackable() == 0 {
            return Err(FreeListError::NoTrackableSlots {
                width: self.width,
                reserve_slot_zero: self.reserve_slot_zero,
            });
        }
        Ok(())
    }

    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| FreeListError::Config(format!("Failed to read {}: {}", path.display(), e)))?;

        Self::parse(&content)
    }

    /// Parse configuration from TOML string
    pub fn parse(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| FreeListError::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Find `freelist.toml` in the current directory or its parents
    pub fn discover() -> Self {
        let mut current = std::env::current_dir().ok();

        while let Some(dir) = current {
            let config_path = dir.join(CONFIG_FILE_NAME);
            if config_path.exists() {
                if let Ok(config) = Self::load(&config_path) {
                    return config;
                }
            }
            current = dir.parent().map(|p| p.to_path_buf());
        }

        Self::default()
    }

    /// Generate default configuration file content
    pub fn generate_default() -> String {
        toml::to_string_pretty(&Self::default())
            .unwrap_or_else(|_| String::from("# Failed to generate config"))
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| FreeListError::Config(format!("Failed to serialize config: {}", e)))?;

        fs::write(path, content)?;
        Ok(())
    }
}
