//! crates/careerhub_core/src/domain.rs
//!
//! Defines the core data structures shared by the relay and the session store.
//! The client never owns the authoritative user record; these are cached,
//! denormalized copies of what the backend origin last returned.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

//=========================================================================================
// User and Profile Records
//=========================================================================================

/// A degree entry nested inside a user's profile.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Education {
    pub degree: String,
    pub institution: String,
    pub year: i32,
}

/// A certification entry nested inside a user's profile.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Certification {
    pub name: String,
    pub issuer: String,
    pub year: i32,
}

/// The authenticated principal, as last reported by the backend.
///
/// Only the identity fields are required. Everything the backend sends that is
/// not modelled here is kept in `extra` so nothing is lost when the record is
/// re-serialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Which registration step the backend considers completed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registration_step: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linkedin_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub portfolio_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_position: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_company: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub years_experience: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skills: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub languages: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub education: Option<Vec<Education>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certifications: Option<Vec<Certification>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<Map<String, Value>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl User {
    /// Display name: the backend's `name` if present, otherwise first + last.
    pub fn display_name(&self) -> String {
        match &self.name {
            Some(name) if !name.trim().is_empty() => name.clone(),
            _ => format!("{} {}", self.first_name, self.last_name)
                .trim()
                .to_string(),
        }
    }
}

//=========================================================================================
// Request Payloads
//=========================================================================================

/// Body of the first registration step.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterStep1Data {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub password_confirmation: String,
}

//=========================================================================================
// Endpoints
//=========================================================================================

/// HTTP verbs used by the relayed endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

/// One backend endpoint exposed through the relay.
///
/// The relay serves each endpoint under the same path it forwards to on the
/// backend origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Login,
    Logout,
    RegisterStep1,
    VerifyEmail,
    CompleteProfile,
    CurrentUser,
}

impl Endpoint {
    pub const ALL: [Endpoint; 6] = [
        Endpoint::Login,
        Endpoint::Logout,
        Endpoint::RegisterStep1,
        Endpoint::VerifyEmail,
        Endpoint::CompleteProfile,
        Endpoint::CurrentUser,
    ];

    pub fn path(self) -> &'static str {
        match self {
            Endpoint::Login => "/api/auth/login",
            Endpoint::Logout => "/api/auth/logout",
            Endpoint::RegisterStep1 => "/api/auth/register/step1",
            Endpoint::VerifyEmail => "/api/auth/register/step2/verify-email",
            Endpoint::CompleteProfile => "/api/auth/register/step3/complete-profile",
            Endpoint::CurrentUser => "/api/user",
        }
    }

    pub fn method(self) -> Method {
        match self {
            Endpoint::CurrentUser => Method::Get,
            _ => Method::Post,
        }
    }

    /// Short name used in logs.
    pub fn name(self) -> &'static str {
        match self {
            Endpoint::Login => "login",
            Endpoint::Logout => "logout",
            Endpoint::RegisterStep1 => "register_step1",
            Endpoint::VerifyEmail => "verify_email",
            Endpoint::CompleteProfile => "complete_profile",
            Endpoint::CurrentUser => "current_user",
        }
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
