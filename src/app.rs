use crate::engine::{Delivery, ErrorReport, FeedMsg, Mode};

/// Requests the UI makes of the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Acquire(Mode),
    Retry,
}

pub struct App {
    pub mode: Mode,
    /// Whether the overlay panel is open.
    pub visible: bool,
    /// True from a request until the engine answers with success or error.
    pub loading: bool,
    /// What is currently on screen.
    pub delivery: Option<Delivery>,
    /// Last terminal failure, cleared by a retry or a later success.
    pub error: Option<ErrorReport>,
    /// Last engine status line.
    pub status: String,
    /// Whether the user has requested to quit.
    pub quit: bool,
}

impl App {
    pub fn new(mode: Mode) -> Self {
        Self {
            mode,
            visible: false,
            loading: false,
            delivery: None,
            error: None,
            status: "Press Space to look at Earth".into(),
            quit: false,
        }
    }

    /// Fold one engine message into the view state.
    pub fn apply(&mut self, msg: FeedMsg) {
        match msg {
            FeedMsg::Success(delivery) => {
                self.loading = false;
                self.error = None;
                if let Delivery::Image(views) = &delivery {
                    self.status = format!("{} images available", views.len());
                }
                self.delivery = Some(delivery);
            }
            FeedMsg::Error(report) => {
                self.loading = false;
                self.status = "Failed".into();
                self.error = Some(report);
            }
            FeedMsg::Status(text) => self.status = text,
        }
    }

    /// Open or close the overlay.  Every open asks the engine for the
    /// current view; a fresh cache or a live stream answers without any
    /// network work.
    pub fn toggle(&mut self) -> Option<Action> {
        self.visible = !self.visible;
        if self.visible && !self.loading {
            self.loading = true;
            return Some(Action::Acquire(self.mode));
        }
        None
    }

    /// Retry after a terminal failure; a no-op otherwise.
    pub fn request_retry(&mut self) -> Option<Action> {
        if self.error.is_none() || self.loading {
            return None;
        }
        self.error = None;
        self.loading = true;
        self.visible = true;
        Some(Action::Retry)
    }
}
