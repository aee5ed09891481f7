//! Data models module
//!
//! This module contains all data structures used throughout the application

pub mod event;
pub mod request;
pub mod stats;

// Re-export commonly used models
pub use event::{
    Event, EventStatus, StateAction, UserStateAction, AdminStateAction, Location, CreateEventRequest,
    NewEventDto, EventFieldsUpdate, UpdateEventUserRequest, UpdateEventAdminRequest, EventFullDto,
    EventShortDto, AdminEventFilter, PublicEventFilter, EventSort,
};
pub use request::{
    ParticipationRequest, RequestStatus, CreateParticipationRequest, ParticipationRequestDto, RequestDecision,
    EventRequestStatusUpdateRequest, EventRequestStatusUpdateResult,
};
pub use stats::{EndpointHit, ViewStats, StatsQuery};
