// SPDX-License-Identifier: AGPL-3.0
// Roster Core - Entities served by the REST API
//
// Field names follow the JSON payloads (camelCase on the wire).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

const USER_AVATAR_BASE: &str = "https://randomuser.me/api/portraits/men";
const COMMENT_AVATAR_BASE: &str = "https://randomuser.me/api/portraits/women";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Geo {
    pub lat: Option<String>,
    pub lng: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Address {
    pub street: Option<String>,
    pub suite: Option<String>,
    pub city: Option<String>,
    pub zipcode: Option<String>,
    pub geo: Option<Geo>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    pub name: Option<String>,
    pub catch_phrase: Option<String>,
    pub bs: Option<String>,
}

/// A user as listed by `/users`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub name: String,
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub address: Option<Address>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub company: Option<Company>,
    #[serde(default)]
    pub image: Option<String>,
}

impl User {
    /// Fill in the portrait URL derived from the user id, unless one is already set
    pub fn with_avatar(mut self) -> Self {
        if self.image.is_none() {
            self.image = Some(format!("{}/{}.jpg", USER_AVATAR_BASE, self.id));
        }
        self
    }

    /// "street, suite, city" with missing parts left out
    pub fn address_line(&self) -> String {
        let Some(address) = &self.address else {
            return String::new();
        };

        [&address.street, &address.suite, &address.city]
            .into_iter()
            .flatten()
            .map(String::as_str)
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub user_id: u64,
    pub id: u64,
    pub title: String,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub post_id: u64,
    pub id: u64,
    pub name: String,
    pub email: String,
    pub body: String,
    #[serde(default)]
    pub image: Option<String>,
}

impl Comment {
    pub fn with_avatar(mut self) -> Self {
        if self.image.is_none() {
            self.image = Some(format!("{}/{}.jpg", COMMENT_AVATAR_BASE, self.id));
        }
        self
    }
}

/// A todo item as listed by `/todos`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub user_id: u64,
    pub id: u64,
    pub title: String,
    pub completed: bool,
}

/// A post together with its comments, fetched as one unit
#[derive(Debug, Clone, PartialEq)]
pub struct PostDetail {
    pub post: Post,
    pub comments: Vec<Comment>,
}

/// Favorite-time snapshot of a user.
///
/// The fields are copied when the user is favorited and are never re-synced
/// with later versions of the same user; `id` is the identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteUser {
    pub id: u64,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    pub username: String,
    #[serde(default)]
    pub favorited_at: Option<DateTime<Utc>>,
}

impl FavoriteUser {
    /// Capture the user as it looks right now
    pub fn snapshot(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            phone: user.phone.clone(),
            image: user.image.clone(),
            username: user.username.clone(),
            favorited_at: Some(Utc::now()),
        }
    }
}

impl From<&User> for FavoriteUser {
    fn from(user: &User) -> Self {
        Self::snapshot(user)
    }
}

/// Entities that can be narrowed down by the search box
pub trait Searchable {
    /// `needle` is already lowercased; an empty needle matches everything
    fn matches(&self, needle: &str) -> bool;
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}

impl Searchable for User {
    fn matches(&self, needle: &str) -> bool {
        contains_ci(&self.name, needle) || contains_ci(&self.email, needle)
    }
}

impl Searchable for FavoriteUser {
    fn matches(&self, needle: &str) -> bool {
        contains_ci(&self.name, needle) || contains_ci(&self.email, needle)
    }
}

impl Searchable for Post {
    fn matches(&self, needle: &str) -> bool {
        contains_ci(&self.title, needle)
    }
}

impl Searchable for Task {
    fn matches(&self, needle: &str) -> bool {
        contains_ci(&self.title, needle)
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn test_user_decodes_from_api_payload() {
        let json = r#"{
            "id": 1,
            "name": "Leanne Graham",
            "username": "Bret",
            "email": "Sincere@april.biz",
            "address": {
                "street": "Kulas Light",
                "suite": "Apt. 556",
                "city": "Gwenborough",
                "zipcode": "92998-3874",
                "geo": { "lat": "-37.3159", "lng": "81.1496" }
            },
            "phone": "1-770-736-8031 x56442",
            "website": "hildegard.org",
            "company": { "name": "Romaguera-Crona", "catchPhrase": "Multi-layered", "bs": "e-markets" }
        }"#;

        let user: User = serde_json::from_str(json).unwrap();
        assert_eq!(user.username, "Bret");
        assert_eq!(user.company.as_ref().and_then(|c| c.catch_phrase.as_deref()), Some("Multi-layered"));
        assert_eq!(user.address_line(), "Kulas Light, Apt. 556, Gwenborough");

        let user = user.with_avatar();
        assert_eq!(
            user.image.as_deref(),
            Some("https://randomuser.me/api/portraits/men/1.jpg")
        );
    }

    #[test]
    fn test_address_line_skips_missing_parts() {
        let mut u = user(3, "Clementine");
        assert_eq!(u.address_line(), "");

        u.address = Some(Address {
            street: Some("Douglas Extension".to_string()),
            city: Some("McKenziehaven".to_string()),
            ..Address::default()
        });
        assert_eq!(u.address_line(), "Douglas Extension, McKenziehaven");
    }

    #[test]
    fn test_snapshot_is_detached_from_source() {
        let mut source = user(7, "Kurtis");
        let favorite = FavoriteUser::snapshot(&source);
        source.name = "Renamed".to_string();

        assert_eq!(favorite.name, "Kurtis");
        assert_eq!(favorite.username, "kurtis");
        assert!(favorite.favorited_at.is_some());
    }

    #[test]
    fn test_search_matching() {
        let u = user(1, "Ann Smith");
        assert!(u.matches("ann"));
        assert!(u.matches("ann smith@"));
        assert!(u.matches(""));
        assert!(!u.matches("bob"));

        let p = post(1, "Qui Est Esse");
        assert!(p.matches("est"));
        assert!(!p.matches("body"));
    }
}
