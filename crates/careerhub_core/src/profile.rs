//! crates/careerhub_core/src/profile.rs
//!
//! The editable profile draft behind the last registration step. Entries can
//! be appended and removed freely; nothing reaches the backend until the draft
//! is turned into a submission.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::domain::{Certification, Education};

/// The personal section, validated before the professional section is shown.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonalInfo {
    /// `YYYY-MM-DD`.
    pub birth_date: String,
    pub phone: String,
    pub location: String,
    pub bio: String,
    pub linkedin_url: String,
    pub portfolio_url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileDraft {
    pub personal: PersonalInfo,
    pub current_position: String,
    pub current_company: String,
    /// Free text as typed; parsed to an integer on submission.
    pub years_experience: String,
    pub skills: Vec<String>,
    pub languages: Vec<String>,
    pub education: Vec<Education>,
    pub certifications: Vec<Certification>,
}

/// Adds a trimmed, non-empty, not-yet-present tag. Returns whether it was added.
fn add_tag(tags: &mut Vec<String>, tag: &str) -> bool {
    let tag = tag.trim();
    if tag.is_empty() || tags.iter().any(|t| t == tag) {
        return false;
    }
    tags.push(tag.to_string());
    true
}

impl ProfileDraft {
    pub fn add_skill(&mut self, skill: &str) -> bool {
        add_tag(&mut self.skills, skill)
    }

    pub fn remove_skill(&mut self, skill: &str) {
        self.skills.retain(|s| s != skill);
    }

    pub fn add_language(&mut self, language: &str) -> bool {
        add_tag(&mut self.languages, language)
    }

    pub fn remove_language(&mut self, language: &str) {
        self.languages.retain(|l| l != language);
    }

    /// Appends a blank education entry for the given year and returns its index.
    pub fn add_education(&mut self, year: i32) -> usize {
        self.education.push(Education {
            year,
            ..Education::default()
        });
        self.education.len() - 1
    }

    pub fn update_education(&mut self, index: usize, edit: impl FnOnce(&mut Education)) -> bool {
        match self.education.get_mut(index) {
            Some(entry) => {
                edit(entry);
                true
            }
            None => false,
        }
    }

    pub fn remove_education(&mut self, index: usize) -> Option<Education> {
        (index < self.education.len()).then(|| self.education.remove(index))
    }

    /// Appends a blank certification entry for the given year and returns its index.
    pub fn add_certification(&mut self, year: i32) -> usize {
        self.certifications.push(Certification {
            year,
            ..Certification::default()
        });
        self.certifications.len() - 1
    }

    pub fn update_certification(
        &mut self,
        index: usize,
        edit: impl FnOnce(&mut Certification),
    ) -> bool {
        match self.certifications.get_mut(index) {
            Some(entry) => {
                edit(entry);
                true
            }
            None => false,
        }
    }

    pub fn remove_certification(&mut self, index: usize) -> Option<Certification> {
        (index < self.certifications.len()).then(|| self.certifications.remove(index))
    }

    /// Builds the body for the profile-completion call.
    ///
    /// Education entries without degree or institution, and certifications
    /// without name or issuer, are left out. `years_experience` becomes an
    /// integer or `null`.
    pub fn to_submission(&self, user_id: i64) -> Value {
        let years_experience = self.years_experience.trim().parse::<i64>().ok();

        let education: Vec<&Education> = self
            .education
            .iter()
            .filter(|e| !e.degree.trim().is_empty() && !e.institution.trim().is_empty())
            .collect();
        let certifications: Vec<&Certification> = self
            .certifications
            .iter()
            .filter(|c| !c.name.trim().is_empty() && !c.issuer.trim().is_empty())
            .collect();

        json!({
            "user_id": user_id,
            "birth_date": self.personal.birth_date,
            "phone": self.personal.phone,
            "location": self.personal.location,
            "bio": self.personal.bio,
            "linkedin_url": self.personal.linkedin_url,
            "portfolio_url": self.personal.portfolio_url,
            "current_position": self.current_position,
            "current_company": self.current_company,
            "years_experience": years_experience,
            "skills": self.skills,
            "languages": self.languages,
            "education": education,
            "certifications": certifications,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_are_trimmed_and_deduplicated() {
        let mut draft = ProfileDraft::default();
        assert!(draft.add_skill("  Rust "));
        assert!(!draft.add_skill("Rust"));
        assert!(!draft.add_skill("   "));
        assert!(draft.add_language("French"));
        draft.remove_skill("Rust");
        assert!(draft.skills.is_empty());
        assert_eq!(draft.languages, vec!["French"]);
    }

    #[test]
    fn incomplete_entries_are_not_submitted() {
        let mut draft = ProfileDraft::default();
        let kept = draft.add_education(2015);
        draft.update_education(kept, |e| {
            e.degree = "MSc".into();
            e.institution = "EPFL".into();
        });
        draft.add_education(2020);
        let cert = draft.add_certification(2022);
        draft.update_certification(cert, |c| c.name = "CKA".into());

        let body = draft.to_submission(42);
        assert_eq!(body["user_id"], 42);
        assert_eq!(body["education"].as_array().unwrap().len(), 1);
        assert_eq!(body["education"][0]["institution"], "EPFL");
        assert!(body["certifications"].as_array().unwrap().is_empty());
    }

    #[test]
    fn years_experience_is_an_integer_or_null() {
        let mut draft = ProfileDraft {
            years_experience: " 7 ".into(),
            ..ProfileDraft::default()
        };
        assert_eq!(draft.to_submission(1)["years_experience"], 7);

        draft.years_experience = "several".into();
        assert!(draft.to_submission(1)["years_experience"].is_null());
    }

    #[test]
    fn removing_out_of_range_is_a_no_op() {
        let mut draft = ProfileDraft::default();
        draft.add_certification(2021);
        assert!(draft.remove_certification(3).is_none());
        assert!(draft.remove_certification(0).is_some());
        assert!(!draft.update_education(0, |_| {}));
    }
}
