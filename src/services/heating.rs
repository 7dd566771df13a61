use crate::client::HeaterApi;
use crate::models::adax::{Content, Room, TargetTemperature, Update, Updates};
use crate::utils::{ResolveError, Target, find_room_id, resolve_target};
use log::{debug, info};

/// Lowest and highest target the heaters accept, in degrees Celsius.
pub const MIN_CELSIUS: f64 = 5.0;
pub const MAX_CELSIUS: f64 = 35.0;

/// Desired change for a resolved target.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum HeatingChange {
    /// Enable heating and set the target temperature.
    SetTarget(TargetTemperature),
    /// Toggle heating, keeping the current target.
    Heating(bool),
}

/// Parse a spoken temperature ("21", "21.5", "21,5") into API units.
pub fn parse_celsius(raw: &str) -> Option<TargetTemperature> {
    let celsius = raw.trim().replace(',', ".").parse::<f64>().ok()?;
    if !celsius.is_finite() || !(MIN_CELSIUS..=MAX_CELSIUS).contains(&celsius) {
        return None;
    }
    Some(TargetTemperature::from_celsius(celsius))
}

/// Build a single-entry batch addressed to `target`.
pub fn updates_for(target: &Target, change: HeatingChange) -> Updates {
    let build = |id: i64| match change {
        HeatingChange::SetTarget(t) => Update::target(id, t),
        HeatingChange::Heating(enabled) => Update::heating(id, enabled),
    };
    let mut updates = Updates::default();
    match target {
        Target::Home { id, .. } => updates.homes.push(build(id.0)),
        Target::Room { id, .. } => updates.rooms.push(build(id.0)),
        Target::Device { id, .. } => updates.devices.push(build(id.0)),
    }
    updates
}

/// Resolve `name` against the account, then submit `change` for it.
pub fn apply_change<A: HeaterApi + ?Sized>(
    api: &A,
    token: &str,
    name: Option<&str>,
    change: HeatingChange,
) -> Result<Target, ResolveError> {
    let content = api.fetch_status(token)?;
    let target = resolve_target(&content, name)?;
    let updates = updates_for(&target, change);
    debug!("Submitting {:?} for {:?}", updates, target);
    api.submit_updates(token, &updates)?;
    info!("Applied {:?} to {}", change, target.name());
    Ok(target)
}

/// Current readings for a named room.
pub fn room_status<A: HeaterApi + ?Sized>(api: &A, token: &str, name: &str) -> Result<Room, ResolveError> {
    let content = api.fetch_status(token)?;
    find_room(content, name).ok_or_else(|| ResolveError::NotFound(name.to_string()))
}

fn find_room(content: Content, name: &str) -> Option<Room> {
    let id = find_room_id(&content, name)?;
    content.rooms.into_iter().find(|r| r.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::adax::{DeviceId, HomeId, RoomId};
    use crate::test_support::{FakeApi, local_client};
    use mockito::Server;

    #[test]
    fn parses_spoken_temperatures() {
        assert_eq!(parse_celsius("21"), Some(TargetTemperature(2100)));
        assert_eq!(parse_celsius(" 21,5 "), Some(TargetTemperature(2150)));
        assert_eq!(parse_celsius("4"), None);
        assert_eq!(parse_celsius("36"), None);
        assert_eq!(parse_celsius("NaN"), None);
        assert_eq!(parse_celsius("warm"), None);
    }

    #[test]
    fn batch_is_keyed_by_target_kind() {
        let home = Target::Home {
            id: HomeId(1),
            name: "Home".into(),
        };
        let device = Target::Device {
            id: DeviceId(100),
            name: "Panel".into(),
        };
        let u = updates_for(&home, HeatingChange::Heating(false));
        assert_eq!(u.homes, vec![Update::heating(1, false)]);
        assert!(u.rooms.is_empty() && u.devices.is_empty());
        let u = updates_for(&device, HeatingChange::SetTarget(TargetTemperature(2000)));
        assert_eq!(u.devices, vec![Update::target(100, TargetTemperature(2000))]);
    }

    #[test]
    fn applies_change_to_named_room() {
        let api = FakeApi::new();
        let target = apply_change(&api, "tok", Some("living room"), HeatingChange::SetTarget(TargetTemperature(2150)))
            .expect("change applied");
        assert_eq!(
            target,
            Target::Room {
                id: RoomId(10),
                name: "Living Room".into()
            }
        );
        let submitted = api.submitted.borrow();
        assert_eq!(submitted.len(), 1);
        assert_eq!(submitted[0].rooms, vec![Update::target(10, TargetTemperature(2150))]);
    }

    #[test]
    fn unknown_room_submits_nothing() {
        let api = FakeApi::new();
        let err = apply_change(&api, "tok", Some("garage"), HeatingChange::Heating(true)).unwrap_err();
        assert!(matches!(err, ResolveError::NotFound(_)));
        assert!(api.submitted.borrow().is_empty());
    }

    #[test]
    fn submit_failure_is_propagated() {
        let mut api = FakeApi::new();
        api.submit_error = Some(500);
        let err = apply_change(&api, "tok", Some("Kitchen"), HeatingChange::Heating(true)).unwrap_err();
        assert!(matches!(err, ResolveError::Api(ref e) if e.status() == Some(500)));
    }

    #[test]
    fn reads_room_status() {
        let api = FakeApi::new();
        let room = room_status(&api, "tok", "Kitchen").expect("room found");
        assert_eq!(room.temperature, Some(1875));
        assert!(!room.heating_enabled);
    }

    #[test]
    fn resolves_living_room_against_mock_api() {
        let body = r#"{"homes":[{"id":1,"name":"Home"}],"rooms":[{"id":10,"homeId":1,"name":"Living Room","heatingEnabled":true,"temperature":2150}],"devices":[]}"#;
        let mut server = Server::new();
        let mock = server
            .mock("GET", "/rest/v1/content")
            .match_header("authorization", "Bearer tok")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(body)
            .create();

        let client = local_client(&server.url(), "", "");
        let room = room_status(&client, "tok", "Living Room").expect("room resolved");
        assert_eq!(room.id, RoomId(10));
        assert_eq!(room.temperature, Some(2150));
        mock.assert();
    }
}
