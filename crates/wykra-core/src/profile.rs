//! Normalized profile fields used for analysis.

use serde::Serialize;

use crate::field::Field;
use crate::handle::ProfileHandle;

/// Names of the optional fields on [`ProjectedProfile`].
///
/// Order here is the rendering order of the prompt and the order of the
/// unavailable-field list on an insight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileField {
    FullName,
    Bio,
    Followers,
    Following,
    Posts,
    EngagementRate,
    Verified,
    BusinessAccount,
    ProfileUrl,
    Categories,
    ContentSignals,
}

impl ProfileField {
    pub const ALL: [ProfileField; 11] = [
        ProfileField::FullName,
        ProfileField::Bio,
        ProfileField::Followers,
        ProfileField::Following,
        ProfileField::Posts,
        ProfileField::EngagementRate,
        ProfileField::Verified,
        ProfileField::BusinessAccount,
        ProfileField::ProfileUrl,
        ProfileField::Categories,
        ProfileField::ContentSignals,
    ];

    /// Label used in prompts and in the unavailable-field note.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            ProfileField::FullName => "full name",
            ProfileField::Bio => "bio",
            ProfileField::Followers => "followers",
            ProfileField::Following => "following",
            ProfileField::Posts => "posts",
            ProfileField::EngagementRate => "engagement rate",
            ProfileField::Verified => "verified",
            ProfileField::BusinessAccount => "business account",
            ProfileField::ProfileUrl => "profile url",
            ProfileField::Categories => "categories",
            ProfileField::ContentSignals => "content signals",
        }
    }
}

/// Bounded, typed view of a scraped profile.
///
/// Every optional field is a [`Field`]; `Unknown` means the provider did not
/// supply a usable value. A list that was present but empty is
/// `Known(vec![])`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectedProfile {
    pub handle: ProfileHandle,
    pub full_name: Field<String>,
    pub bio: Field<String>,
    pub followers: Field<u64>,
    pub following: Field<u64>,
    pub posts: Field<u64>,
    /// Average engagement per post as a fraction in `[0, 1]`.
    pub engagement_rate: Field<f64>,
    pub verified: Field<bool>,
    pub business_account: Field<bool>,
    pub profile_url: Field<String>,
    pub categories: Field<Vec<String>>,
    pub content_signals: Field<Vec<String>>,
}

impl ProjectedProfile {
    /// A profile where nothing but the handle is known.
    #[must_use]
    pub fn unknown(handle: ProfileHandle) -> Self {
        Self {
            handle,
            full_name: Field::Unknown,
            bio: Field::Unknown,
            followers: Field::Unknown,
            following: Field::Unknown,
            posts: Field::Unknown,
            engagement_rate: Field::Unknown,
            verified: Field::Unknown,
            business_account: Field::Unknown,
            profile_url: Field::Unknown,
            categories: Field::Unknown,
            content_signals: Field::Unknown,
        }
    }

    #[must_use]
    pub fn is_known(&self, field: ProfileField) -> bool {
        match field {
            ProfileField::FullName => self.full_name.is_known(),
            ProfileField::Bio => self.bio.is_known(),
            ProfileField::Followers => self.followers.is_known(),
            ProfileField::Following => self.following.is_known(),
            ProfileField::Posts => self.posts.is_known(),
            ProfileField::EngagementRate => self.engagement_rate.is_known(),
            ProfileField::Verified => self.verified.is_known(),
            ProfileField::BusinessAccount => self.business_account.is_known(),
            ProfileField::ProfileUrl => self.profile_url.is_known(),
            ProfileField::Categories => self.categories.is_known(),
            ProfileField::ContentSignals => self.content_signals.is_known(),
        }
    }

    /// Fields the provider did not supply, in [`ProfileField::ALL`] order.
    #[must_use]
    pub fn unknown_fields(&self) -> Vec<ProfileField> {
        ProfileField::ALL
            .into_iter()
            .filter(|f| !self.is_known(*f))
            .collect()
    }
}
