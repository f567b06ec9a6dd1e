use cpufreq_control::{
    Controller, CpufreqError, Fault, Policy, Principal, Registry, StaticBackend, UnitRecord,
    release_list, release_policy,
};

fn controller(principal: Principal) -> Controller {
    Controller::new(Registry::reference(), StaticBackend::reference(2), principal)
}

fn wide_controller(principal: Principal) -> Controller {
    let records = (0..8)
        .map(|i| {
            UnitRecord::new(
                1_000_000 + i,
                1000,
                (100_000, 2_000_000),
                (100_000, 2_000_000),
                "ondemand",
            )
        })
        .collect();
    Controller::new(
        Registry::new(records).unwrap(),
        StaticBackend::reference(8),
        principal,
    )
}

#[test]
fn set_frequency_then_read_returns_value() {
    let mut c = wide_controller(Principal::Elevated);
    for id in 0..8 {
        let target = 500_000 + id as u64 * 1000;
        c.set_frequency(id, target).unwrap();
        assert_eq!(c.frequency_reported(id), Ok(target));
    }
}

#[test]
fn out_of_range_ids_are_not_found_everywhere() {
    let mut c = controller(Principal::Elevated);
    let before = c.registry().clone();

    for id in [2, 3, 64, usize::MAX] {
        let not_found: Result<(), CpufreqError> = Err(CpufreqError::NotFound { id });
        assert_eq!(c.frequency_reported(id).map(|_| ()), not_found);
        assert_eq!(c.frequency_measured(id).map(|_| ()), not_found);
        assert_eq!(c.transition_latency(id).map(|_| ()), not_found);
        assert_eq!(c.hardware_limits(id).map(|_| ()), not_found);
        assert_eq!(c.policy(id).map(|_| ()), not_found);
        assert_eq!(c.available_governors(id).map(|_| ()), not_found);
        assert_eq!(c.available_frequencies(id).map(|_| ()), not_found);
        assert_eq!(c.affected_units(id).map(|_| ()), not_found);
        assert_eq!(c.related_units(id).map(|_| ()), not_found);
        assert_eq!(c.stats(id).map(|_| ()), not_found);
        assert_eq!(c.driver_name(id).map(|_| ()), not_found);
        assert_eq!(c.transition_count(id).map(|_| ()), not_found);
        assert_eq!(c.set_frequency(id, 1), not_found);
        assert_eq!(c.modify_policy_min(id, 1), not_found);
        assert_eq!(c.modify_policy_max(id, 1), not_found);
        assert_eq!(c.modify_policy_governor(id, Some("powersave")), not_found);
        assert_eq!(
            c.set_policy(id, Some(&Policy::new(1, 2, "powersave"))),
            not_found
        );
    }

    assert_eq!(c.registry(), &before);
}

#[test]
fn faulted_frequency_always_returns_the_fault() {
    let mut c = controller(Principal::Elevated);
    let fault = Err(CpufreqError::Fault(Fault::ACCESS_DENIED));
    for _ in 0..3 {
        assert_eq!(c.frequency_reported(1), fault);
        assert_eq!(c.frequency_measured(1), fault);
        assert_eq!(c.set_frequency(1, 1_000_000).map(|_| 0), fault);
    }
}

#[test]
fn hardware_limits_missing_slot_is_invalid_argument() {
    let c = controller(Principal::Unprivileged);
    let mut slot = 0xdead_u64;
    assert!(matches!(
        c.hardware_limits_into(0, None, Some(&mut slot)),
        Err(CpufreqError::InvalidArgument(_))
    ));
    assert!(matches!(
        c.hardware_limits_into(0, Some(&mut slot), None),
        Err(CpufreqError::InvalidArgument(_))
    ));
    assert_eq!(slot, 0xdead);
}

#[test]
fn policy_release_and_absent_release() {
    let c = controller(Principal::Unprivileged);
    let snapshot = c.policy(0).unwrap();
    release_policy(Some(snapshot));
    release_policy(None);
}

#[test]
fn available_governors_literal_order_and_release() {
    let c = wide_controller(Principal::Unprivileged);
    for id in c.units() {
        let governors = c.available_governors(id).unwrap();
        let names: Vec<&str> = governors.iter().map(String::as_str).collect();
        assert_eq!(
            names,
            ["conservative", "ondemand", "powersave", "userspace", "performance"]
        );
        assert_eq!(release_list(Some(governors)), 5);
    }
}

#[test]
fn unprivileged_mutations_change_nothing() {
    let mut c = wide_controller(Principal::Unprivileged);
    let before = c.registry().clone();

    for id in c.units().collect::<Vec<_>>() {
        let denied = Err(CpufreqError::PermissionDenied);
        assert_eq!(c.set_frequency(id, 42), denied);
        assert_eq!(c.modify_policy_min(id, 42), denied);
        assert_eq!(c.modify_policy_max(id, 42), denied);
        assert_eq!(c.modify_policy_governor(id, Some("userspace")), denied);
        assert_eq!(c.set_policy(id, Some(&Policy::new(1, 2, "userspace"))), denied);
    }

    assert_eq!(c.registry(), &before);
}

#[test]
fn long_governor_name_rejected_for_every_id() {
    let mut c = controller(Principal::Unprivileged);
    let name = "a-governor-name-of-20";
    assert!(name.len() > 19);
    for id in [0, 1, 2, 99, usize::MAX] {
        assert!(matches!(
            c.modify_policy_governor(id, Some(name)),
            Err(CpufreqError::InvalidArgument(_))
        ));
    }
}
