//! Ways to filter listings based on query-string parameters. Filter semantics work just like SQL:
//! If a parameter is absent, its filter won't be applied (or its default is used).
//! If present, it must be well-formed. A parameter that is present but empty is malformed, except
//! for `search`, `sortBy` and `orderBy`, where empty means the same as absent.
use crate::datastore::query::Page;
use crate::twoface::{ExternalError, Fallible, TfError};
use actix_web::{dev::Payload, FromRequest, HttpRequest};
use futures::future::{ready, Ready};

const INVALID_LIMIT: ExternalError =
    ExternalError::invalid_field("limit must be a non-negative integer");
const INVALID_OFFSET: ExternalError =
    ExternalError::invalid_field("offset must be a non-negative integer");
const INVALID_TAG: ExternalError = ExternalError::invalid_field("searchTag must not be empty");
const INVALID_ONLY_FRIEND: ExternalError =
    ExternalError::invalid_field("onlyFriend must be true or false");
const INVALID_SORT_BY: ExternalError =
    ExternalError::invalid_field("sortBy must be createdAt or friendCount");
const INVALID_ORDER_BY: ExternalError =
    ExternalError::invalid_field("orderBy must be one of: asc, desc (case-insensitive)");

/// Raw query-string parameters, in the order they were given. Keys may repeat.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FilterSet {
    pairs: Vec<(String, String)>,
}

impl FilterSet {
    pub fn parse(query_string: &str) -> Self {
        Self {
            pairs: url::form_urlencoded::parse(query_string.as_bytes())
                .into_owned()
                .collect(),
        }
    }

    /// First value given for `key`. `Some("")` means the key was present but empty.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Every value of a repeatable key, accepting both `key=` and `key[]=` spellings.
    pub fn get_all(&self, key: &str) -> Vec<&str> {
        self.pairs
            .iter()
            .filter(|(k, _)| k == key || k.strip_suffix("[]") == Some(key))
            .map(|(_, v)| v.as_str())
            .collect()
    }

    fn page(&self) -> Fallible<Page> {
        let default = Page::default();
        Ok(Page {
            limit: non_negative(self.get("limit"), default.limit, INVALID_LIMIT)?,
            offset: non_negative(self.get("offset"), default.offset, INVALID_OFFSET)?,
        })
    }
}

impl FromRequest for FilterSet {
    type Error = TfError;
    type Future = Ready<Fallible<Self>>;
    type Config = ();

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(Ok(Self::parse(req.query_string())))
    }
}

fn non_negative(value: Option<&str>, default: i64, invalid: ExternalError) -> Fallible<i64> {
    guard!(let Some(value) = value else {
        return Ok(default);
    });
    match value.parse::<i64>() {
        Ok(n) if n >= 0 => Ok(n),
        _ => Err(invalid.into()),
    }
}

/// Filters for the posts listing.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PostFilters {
    /// Substring of the post's HTML.
    pub search: Option<String>,
    /// Every tag must be present on the post.
    pub tags: Vec<String>,
    pub page: Page,
}

impl PostFilters {
    pub fn from_filter_set(filters: &FilterSet) -> Fallible<Self> {
        let tags = filters.get_all("searchTag");
        if tags.iter().any(|tag| tag.is_empty()) {
            return Err(INVALID_TAG.into());
        }
        Ok(Self {
            search: filters
                .get("search")
                .filter(|s| !s.is_empty())
                .map(str::to_owned),
            tags: tags.into_iter().map(str::to_owned).collect(),
            page: filters.page()?,
        })
    }
}

/// Column a friends listing can be sorted on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortBy {
    CreatedAt,
    FriendCount,
}

impl SortBy {
    pub fn column(self) -> &'static str {
        match self {
            Self::CreatedAt => "u.created_at",
            Self::FriendCount => "u.friend_count",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

impl Direction {
    pub fn keyword(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// Filters for the friends listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FriendFilters {
    /// Only users connected to the requester, never the requester themselves.
    pub only_friend: bool,
    /// Substring of the user's name.
    pub search: Option<String>,
    pub sort_by: SortBy,
    pub order_by: Direction,
    pub page: Page,
}

impl Default for FriendFilters {
    fn default() -> Self {
        Self {
            only_friend: false,
            search: None,
            sort_by: SortBy::CreatedAt,
            order_by: Direction::Desc,
            page: Page::default(),
        }
    }
}

impl FriendFilters {
    pub fn from_filter_set(filters: &FilterSet) -> Fallible<Self> {
        let only_friend = match filters.get("onlyFriend") {
            None => false,
            Some(value) => parse_bool(value).ok_or(INVALID_ONLY_FRIEND)?,
        };
        let sort_by = match filters.get("sortBy") {
            None | Some("") | Some("createdAt") => SortBy::CreatedAt,
            Some("friendCount") => SortBy::FriendCount,
            Some(_) => return Err(INVALID_SORT_BY.into()),
        };
        let order_by = match filters.get("orderBy") {
            None | Some("") => Direction::Desc,
            Some(value) if value.eq_ignore_ascii_case("asc") => Direction::Asc,
            Some(value) if value.eq_ignore_ascii_case("desc") => Direction::Desc,
            Some(_) => return Err(INVALID_ORDER_BY.into()),
        };
        Ok(Self {
            only_friend,
            search: filters
                .get("search")
                .filter(|s| !s.is_empty())
                .map(str::to_owned),
            sort_by,
            order_by,
            page: filters.page()?,
        })
    }
}

/// The spellings of true/false that clients send for boolean flags.
fn parse_bool(value: &str) -> Option<bool> {
    match value {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Some(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Some(false),
        _ => None,
    }
}
