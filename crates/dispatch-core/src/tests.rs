#[cfg(test)]
mod tests {
    use glam::IVec2;

    use crate::catalog::{Catalog, Protocol, BUILTIN_CALLS, BUILTIN_CITY};
    use crate::commands::PlayerCommand;
    use crate::enums::*;
    use crate::error::CatalogError;
    use crate::events::Outcome;
    use crate::types::{manhattan, GridSize, SimTime};

    const TINY_CITY: &str = r#"{
        "id": "tiny", "name": "Tiny",
        "grid": { "w": 4, "h": 4 },
        "hotspots": [ { "name": "Square", "x": 1, "y": 1 } ],
        "bases": [ { "agency": "police", "x": 0, "y": 0 } ],
        "units": [ { "id": "P1", "name": "Patrol", "role": "area_patrol", "agency": "police" } ]
    }"#;

    // ---- Severity order ----

    #[test]
    fn test_severity_total_order() {
        assert!(Severity::Prank < Severity::Low);
        assert!(Severity::Low < Severity::Medium);
        assert!(Severity::Medium < Severity::High);
        let mut shuffled = vec![Severity::High, Severity::Prank, Severity::Medium, Severity::Low];
        shuffled.sort();
        assert_eq!(shuffled, Severity::ALL.to_vec());
    }

    #[test]
    fn test_severity_escalate_never_regresses() {
        for from in Severity::ALL {
            for to in Severity::ALL {
                let next = from.escalate(to);
                assert!(next >= from, "{from:?} -> {to:?} regressed to {next:?}");
                assert!(next >= to);
            }
        }
    }

    #[test]
    fn test_severity_serde_lowercase() {
        assert_eq!(serde_json::to_string(&Severity::Medium).unwrap(), "\"medium\"");
        let back: Severity = serde_json::from_str("\"prank\"").unwrap();
        assert_eq!(back, Severity::Prank);
    }

    // ---- Commands ----

    #[test]
    fn test_command_tagged_json() {
        let json = serde_json::to_string(&PlayerCommand::Answer { call_id: 7 }).unwrap();
        assert_eq!(json, r#"{"type":"Answer","call_id":7}"#);

        let cmd: PlayerCommand =
            serde_json::from_str(r#"{"type":"Dispatch","incident_id":3,"unit_id":"P1"}"#).unwrap();
        assert_eq!(
            cmd,
            PlayerCommand::Dispatch {
                incident_id: 3,
                unit_id: "P1".into()
            }
        );
    }

    // ---- Types ----

    #[test]
    fn test_manhattan_and_grid_clamp() {
        assert_eq!(manhattan(IVec2::new(1, 1), IVec2::new(4, -3)), 7);
        assert_eq!(manhattan(IVec2::new(2, 2), IVec2::new(2, 2)), 0);

        let grid = GridSize::new(18, 12);
        assert_eq!(grid.clamp(IVec2::new(-1, 20)), IVec2::new(0, 11));
        assert!(grid.contains(IVec2::new(17, 11)));
        assert!(!grid.contains(IVec2::new(18, 0)));
    }

    #[test]
    fn test_sim_time_advance() {
        let mut t = SimTime::default();
        for _ in 0..10 {
            t.advance(0.1);
        }
        assert_eq!(t.tick, 10);
        assert!((t.elapsed_secs - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_warning_outcomes() {
        assert!(Outcome::RealCallDismissed.is_warning());
        assert!(Outcome::ResolvedMismatch.is_warning());
        assert!(Outcome::WastedDispatch.is_warning());
        assert!(!Outcome::QueueExpired.is_warning());
        assert!(!Outcome::PrankDismissed.is_warning());
    }

    // ---- Catalog ----

    #[test]
    fn test_builtin_catalog_validates() {
        let catalog = Catalog::builtin().expect("builtin content must validate");
        assert!(catalog.templates().len() >= 8);
        assert!(catalog.templates().iter().any(|t| t.is_prank()));
        assert!(catalog
            .templates()
            .iter()
            .any(|t| t.base_severity == Severity::High));

        let city = catalog.city();
        for template in catalog.templates() {
            assert!(city.hotspot(&template.hotspot).is_some());
            for id in template.protocol.mandatory() {
                assert!(template.protocol.question(id).is_some());
            }
        }
        for unit in &city.units {
            assert!(city.base_cell(unit.agency).is_some());
        }
    }

    #[test]
    fn test_missing_protocol_becomes_unscripted() {
        let catalog = Catalog::builtin().unwrap();
        let fall = catalog.template("fall_injury").unwrap();
        assert_eq!(fall.protocol, Protocol::Unscripted);
        assert!(fall.protocol.mandatory().is_empty());
    }

    #[test]
    fn test_template_defaults_applied() {
        let calls = r#"{ "calls": [ {
            "id": "t", "title": "T", "agency": "police", "opening": "hello",
            "base_severity": "low",
            "response": { "correct": ["area_patrol"] }
        } ] }"#;
        let catalog = Catalog::from_json_strs(calls, TINY_CITY).unwrap();
        let t = catalog.template("t").unwrap();
        assert_eq!(t.hotspot, "Square");
        assert_eq!(t.question_cost_secs, crate::constants::DEFAULT_QUESTION_COST_SECS);
        assert_eq!(t.response.required(), Some("area_patrol"));
    }

    #[test]
    fn test_unknown_mandatory_question_rejected() {
        let calls = r#"{ "calls": [ {
            "id": "bad", "title": "Bad", "agency": "police", "opening": "x",
            "base_severity": "low",
            "protocol": { "mandatory": ["addr"], "questions": [] },
            "response": { "correct": ["area_patrol"] }
        } ] }"#;
        let err = Catalog::from_json_strs(calls, TINY_CITY).unwrap_err();
        assert!(matches!(err, CatalogError::UnknownMandatoryQuestion { .. }), "{err}");
    }

    #[test]
    fn test_real_call_without_roles_rejected() {
        let calls = r#"{ "calls": [ {
            "id": "noroles", "title": "No roles", "agency": "fire", "opening": "x",
            "base_severity": "medium"
        } ] }"#;
        let err = Catalog::from_json_strs(calls, TINY_CITY).unwrap_err();
        assert!(matches!(err, CatalogError::MissingRoles(ref id) if id == "noroles"));
    }

    #[test]
    fn test_unknown_hotspot_rejected() {
        let calls = r#"{ "calls": [ {
            "id": "lost", "title": "Lost", "agency": "police", "opening": "x",
            "base_severity": "low", "hotspot": "Atlantis",
            "response": { "correct": ["area_patrol"] }
        } ] }"#;
        let err = Catalog::from_json_strs(calls, TINY_CITY).unwrap_err();
        assert!(matches!(err, CatalogError::UnknownHotspot { .. }));
    }

    #[test]
    fn test_invalid_timings_rejected() {
        let cases = [
            (r#""question_cost_secs": -30"#, "question_cost_secs"),
            (r#""resolve_secs": 0"#, "resolve_secs"),
            (r#""call_timeout_secs": -1"#, "call_timeout_secs"),
            (r#""events": [ { "at_secs": -2, "text": "early" } ]"#, "events.at_secs"),
        ];
        for (field_json, expected_field) in cases {
            let calls = format!(
                r#"{{ "calls": [ {{
                    "id": "timing", "title": "Timing", "agency": "police", "opening": "x",
                    "base_severity": "low", {field_json},
                    "response": {{ "correct": ["area_patrol"] }}
                }} ] }}"#
            );
            let err = Catalog::from_json_strs(&calls, TINY_CITY).unwrap_err();
            assert!(
                matches!(err, CatalogError::InvalidValue { field, .. } if field == expected_field),
                "{expected_field}: {err}"
            );
        }
    }

    #[test]
    fn test_zero_question_cost_accepted() {
        let calls = r#"{ "calls": [ {
            "id": "free", "title": "Free", "agency": "police", "opening": "x",
            "base_severity": "low", "question_cost_secs": 0,
            "response": { "correct": ["area_patrol"] }
        } ] }"#;
        let catalog = Catalog::from_json_strs(calls, TINY_CITY).unwrap();
        assert_eq!(catalog.template("free").unwrap().question_cost_secs, 0.0);
    }

    #[test]
    fn test_duplicate_template_rejected() {
        let one = r#"{ "id": "dup", "title": "D", "agency": "police", "opening": "x",
            "base_severity": "prank" }"#;
        let calls = format!(r#"{{ "calls": [ {one}, {one} ] }}"#);
        let err = Catalog::from_json_strs(&calls, TINY_CITY).unwrap_err();
        assert!(matches!(err, CatalogError::Duplicate { kind: "template", .. }));
    }

    #[test]
    fn test_city_without_base_rejected() {
        let city = TINY_CITY.replace(r#""agency": "police", "x": 0"#, r#""agency": "fire", "x": 0"#);
        let err = Catalog::from_json_strs(BUILTIN_CALLS, &city).unwrap_err();
        assert!(matches!(err, CatalogError::MissingBase(Agency::Police)));
    }

    #[test]
    fn test_malformed_json_reports_source() {
        let err = Catalog::from_json_strs("{ nope", BUILTIN_CITY).unwrap_err();
        assert!(matches!(err, CatalogError::Parse { what: "calls", .. }));
    }

    #[test]
    fn test_nice_to_have_roles_exclude_required() {
        let catalog = Catalog::builtin().unwrap();
        let package = catalog.template("suspicious_package").unwrap();
        assert_eq!(package.response.required(), Some("bomb_squad"));
        assert_eq!(
            package.response.nice_to_have(),
            vec!["area_patrol".to_string(), "tactical".to_string()]
        );
    }

    #[test]
    fn test_routing_flag_read_from_protocol() {
        let catalog = Catalog::builtin().unwrap();
        assert!(catalog.template("suspicious_package").unwrap().routing);
        assert!(catalog.template("apartment_fire").unwrap().routing);
        assert!(!catalog.template("fall_injury").unwrap().routing);
        assert!(!catalog.template("kitchen_smoke").unwrap().routing);
    }
}
