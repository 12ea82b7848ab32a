//! Runtime configuration resolved from flags, environment and the user config dir.

use std::path::PathBuf;

use dirs::config_dir;

/// Default fee in Shor.
pub const DEFAULT_FEE: u64 = 100;
pub const DEFAULT_TREE_HEIGHT: u8 = 10;
pub const APP_DIR: &str = "qrl-offline-signer";
pub const WORDLIST_FILE: &str = "wordlist.txt";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WordlistSource {
    /// Given on the command line or via `QRL_WORDLIST`; must load.
    Explicit(PathBuf),
    /// Conventional location; used only if present.
    Default(PathBuf),
    None,
}

impl WordlistSource {
    pub fn resolve(explicit: Option<PathBuf>) -> Self {
        match explicit {
            Some(p) => WordlistSource::Explicit(p),
            None => match default_wordlist_path() {
                Some(p) => WordlistSource::Default(p),
                None => WordlistSource::None,
            },
        }
    }
}

#[derive(Debug, Clone)]
pub struct SignerConfig {
    pub default_fee: u64,
    pub wordlist: WordlistSource,
    pub ots_ledger: Option<PathBuf>,
}

impl Default for SignerConfig {
    fn default() -> Self {
        Self { default_fee: DEFAULT_FEE, wordlist: WordlistSource::None, ots_ledger: None }
    }
}

impl SignerConfig {
    pub fn new(wordlist: Option<PathBuf>, ots_ledger: Option<PathBuf>) -> Self {
        Self { default_fee: DEFAULT_FEE, wordlist: WordlistSource::resolve(wordlist), ots_ledger }
    }
}

#[cfg(target_os = "windows")]
fn app_config_dir() -> Option<PathBuf> {
    std::env::var_os("APPDATA").map(PathBuf::from).or_else(config_dir).map(|b| b.join(APP_DIR))
}

#[cfg(not(target_os = "windows"))]
fn app_config_dir() -> Option<PathBuf> {
    config_dir().map(|b| b.join(APP_DIR))
}

pub fn default_wordlist_path() -> Option<PathBuf> {
    app_config_dir().map(|d| d.join(WORDLIST_FILE))
}
