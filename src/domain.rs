use derive_setters::Setters;
use ratatui::crossterm::event::KeyEvent;
use std::fmt;
use std::io::Error;

use crate::filter::{FilterField, FilterState};
use crate::record::VehicleCode;

#[derive(Debug)]
pub enum TVError {
    IoError(Error),
    JsonError(serde_json::Error),
    LoadingFailed(String),
    FileNotFound,
    PermissionDenied,
    LoaderDisconnected,
}

impl fmt::Display for TVError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TVError::IoError(e) => write!(f, "io error: {e}"),
            TVError::JsonError(e) => write!(f, "invalid vehicle data: {e}"),
            TVError::LoadingFailed(msg) => write!(f, "loading failed: {msg}"),
            TVError::FileNotFound => write!(f, "data file not found"),
            TVError::PermissionDenied => write!(f, "permission denied reading data file"),
            TVError::LoaderDisconnected => write!(f, "loader stopped before delivering data"),
        }
    }
}

impl std::error::Error for TVError {}

impl From<Error> for TVError {
    fn from(err: Error) -> Self {
        TVError::IoError(err)
    }
}

impl From<serde_json::Error> for TVError {
    fn from(err: serde_json::Error) -> Self {
        TVError::JsonError(err)
    }
}

#[derive(Debug)]
pub enum Message {
    Quit,
    Help,
    Exit,
    Enter,
    MoveUp,
    MoveDown,
    MoveLeft,
    MoveRight,
    NextPage,
    PrevPage,
    FirstPage,
    LastPage,
    CyclePageSize,
    ToggleSort,
    EditFilter(FilterField),
    PickFacet(FilterField),
    ClearFilters,
    CopyRow,
    CopyCell,
    Reload,
    RawKey(KeyEvent),
    Loaded(Vec<VehicleCode>, u128),
    LoadFailed(TVError),
}

#[derive(Debug, Clone, Setters)]
#[setters(prefix = "with_")]
pub struct TVConfig {
    pub event_poll_time: u64,
    pub max_column_width: usize,
    pub page_size: usize,
    pub page_sizes: Vec<usize>,
    pub initial_filter: FilterState,
}

impl Default for TVConfig {
    fn default() -> Self {
        TVConfig {
            event_poll_time: 100,
            max_column_width: 40,
            page_size: 10,
            page_sizes: vec![10, 25, 50, 100],
            initial_filter: FilterState::default(),
        }
    }
}

pub const HELP_TEXT: &str = "\
q          quit
?          this help
Esc        close popup / cancel input
Up/Down    select row (k/j)
Left/Right select column (h/l)
n p        next / previous page (PageDown / PageUp)
g G        first / last page
+          cycle page size
s          sort by selected column (asc, desc, off)
/          edit global filter
o d c      edit organization / department / counterparty filter
O D C      pick organization / department / counterparty from list
x          clear all filters
Enter      show selected record
y Y        copy row / cell to clipboard
r          reload data";
