use crate::client::ApiError;
use crate::models::adax::{Content, DeviceId, HomeId, RoomId};
use std::error::Error;
use std::fmt::{self, Display, Formatter};

/// Something an update can be addressed to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Home { id: HomeId, name: String },
    Room { id: RoomId, name: String },
    Device { id: DeviceId, name: String },
}

impl Target {
    pub fn name(&self) -> &str {
        match self {
            Target::Home { name, .. } | Target::Room { name, .. } | Target::Device { name, .. } => name,
        }
    }
}

/// Errors that can occur while resolving a spoken name against the account.
#[derive(Debug)]
pub enum ResolveError {
    /// Underlying API client error
    Api(ApiError),
    /// No room or device carries this name
    NotFound(String),
    /// No name was given and the account does not have exactly one home
    NoSingleHome(usize),
}

impl Display for ResolveError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ResolveError::Api(e) => write!(f, "api error: {}", e),
            ResolveError::NotFound(name) => write!(f, "no room or device named {:?}", name),
            ResolveError::NoSingleHome(n) => write!(f, "expected exactly one home, account has {}", n),
        }
    }
}

impl Error for ResolveError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ResolveError::Api(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ApiError> for ResolveError {
    fn from(value: ApiError) -> Self {
        ResolveError::Api(value)
    }
}

/// Find a room id by name: exact match first, then ignoring case and surrounding whitespace.
pub fn find_room_id(content: &Content, name: &str) -> Option<RoomId> {
    find_by_name(content.rooms.iter().map(|r| (r.id, r.name.as_str())), name)
}

/// Resolve a spoken name to a room, then a device. Without a name, the
/// account's only home is the target.
pub fn resolve_target(content: &Content, name: Option<&str>) -> Result<Target, ResolveError> {
    let Some(name) = name else {
        return match content.homes.as_slice() {
            [home] => Ok(Target::Home {
                id: home.id,
                name: home.name.clone(),
            }),
            homes => Err(ResolveError::NoSingleHome(homes.len())),
        };
    };

    if let Some(id) = find_room_id(content, name)
        && let Some(room) = content.rooms.iter().find(|r| r.id == id)
    {
        return Ok(Target::Room {
            id,
            name: room.name.clone(),
        });
    }

    let device = find_by_name(content.devices.iter().map(|d| (d.id, d.name.as_str())), name);
    if let Some(id) = device
        && let Some(d) = content.devices.iter().find(|d| d.id == id)
    {
        return Ok(Target::Device {
            id,
            name: d.name.clone(),
        });
    }

    Err(ResolveError::NotFound(name.to_string()))
}

fn find_by_name<'a, I, T>(candidates: I, name: &str) -> Option<T>
where
    I: Iterator<Item = (T, &'a str)> + Clone,
    T: Copy,
{
    let wanted = name.trim();
    let folded = wanted.to_lowercase();
    candidates
        .clone()
        .find(|(_, n)| *n == wanted)
        .or_else(|| candidates.into_iter().find(|(_, n)| n.trim().to_lowercase() == folded))
        .map(|(id, _)| id)
}
