//! Background music playback machine.
//!
//! ```text
//! Stopped ──play──▶ Playing ──pause──▶ Paused ──play──▶ Playing
//!    ▲                                                     │
//!    └──────────────── music toggle off ◀─────────────────┘
//! ```
//!
//! A failed start (autoplay policy) leaves the machine where it was.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackState {
    #[default]
    Stopped,
    Playing,
    Paused,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PlaybackError {
    #[error("playback blocked by autoplay policy")]
    Blocked,

    #[error("audio unavailable: {0}")]
    Unavailable(String),
}

/// The audio element. Implementations live outside the core.
pub trait AudioTransport {
    fn play(&mut self) -> Result<(), PlaybackError>;
    fn pause(&mut self);
    fn stop(&mut self);
}

impl<T: AudioTransport + ?Sized> AudioTransport for Box<T> {
    fn play(&mut self) -> Result<(), PlaybackError> {
        (**self).play()
    }

    fn pause(&mut self) {
        (**self).pause()
    }

    fn stop(&mut self) {
        (**self).stop()
    }
}

#[derive(Debug)]
pub struct PlaybackMachine<A> {
    state: PlaybackState,
    transport: A,
}

impl<A: AudioTransport> PlaybackMachine<A> {
    pub fn new(transport: A) -> Self {
        Self {
            state: PlaybackState::Stopped,
            transport,
        }
    }

    /// Pick up where a previous machine left off, e.g. a state reported by
    /// the page that owns the audio element.
    pub fn with_state(transport: A, state: PlaybackState) -> Self {
        Self { state, transport }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn into_transport(self) -> A {
        self.transport
    }

    /// Start or resume. On failure the state is unchanged.
    pub fn play(&mut self) -> Result<PlaybackState, PlaybackError> {
        if self.state != PlaybackState::Playing {
            self.transport.play()?;
            self.state = PlaybackState::Playing;
        }
        Ok(self.state)
    }

    pub fn pause(&mut self) -> PlaybackState {
        if self.state == PlaybackState::Playing {
            self.transport.pause();
            self.state = PlaybackState::Paused;
        }
        self.state
    }

    /// Play when not playing, pause when playing.
    pub fn toggle(&mut self) -> Result<PlaybackState, PlaybackError> {
        match self.state {
            PlaybackState::Playing => Ok(self.pause()),
            PlaybackState::Stopped | PlaybackState::Paused => self.play(),
        }
    }

    pub fn stop(&mut self) -> PlaybackState {
        if self.state != PlaybackState::Stopped {
            self.transport.stop();
        }
        self.state = PlaybackState::Stopped;
        self.state
    }
}
