//! Privilege-gated operations that overwrite registry fields.
//!
//! Every operation checks, in order: argument shape, unit bounds, privilege.
//! A failed gate leaves the record untouched.

use log::debug;

use crate::UnitId;
use crate::backend::Backend;
use crate::constants::GOVERNOR_ARG_MAX;
use crate::controller::Controller;
use crate::error::{CpufreqError, Result};
use crate::policy::Policy;

impl<B: Backend> Controller<B> {
    /// Replace min, max and governor at once.
    ///
    /// A fault already stored in `policy_min` or `policy_max` is returned
    /// unchanged and nothing is written.
    pub fn set_policy(&mut self, id: UnitId, policy: Option<&Policy>) -> Result<()> {
        let Some(policy) = policy.filter(|p| !p.governor.is_empty()) else {
            return Err(CpufreqError::InvalidArgument("policy and governor are required"));
        };
        self.check_bounds(id)?;
        self.require_elevated("set_policy", id)?;

        let record = self.registry.get_mut(id)?;
        record.policy_min.read()?;
        record.policy_max.read()?;

        record.policy_min.write(policy.min);
        record.policy_max.write(policy.max);
        record.set_policy_governor(&policy.governor);
        debug!(
            "unit {id}: policy set to {}..{} {}",
            policy.min,
            policy.max,
            record.policy_governor()
        );
        Ok(())
    }

    /// Overwrite `policy_min`, replacing any stored fault.
    pub fn modify_policy_min(&mut self, id: UnitId, value: u64) -> Result<()> {
        self.check_bounds(id)?;
        self.require_elevated("modify_policy_min", id)?;
        self.registry.get_mut(id)?.policy_min.write(value);
        debug!("unit {id}: policy min set to {value}");
        Ok(())
    }

    /// Overwrite `policy_max`, replacing any stored fault.
    pub fn modify_policy_max(&mut self, id: UnitId, value: u64) -> Result<()> {
        self.check_bounds(id)?;
        self.require_elevated("modify_policy_max", id)?;
        self.registry.get_mut(id)?.policy_max.write(value);
        debug!("unit {id}: policy max set to {value}");
        Ok(())
    }

    pub fn modify_policy_governor(&mut self, id: UnitId, name: Option<&str>) -> Result<()> {
        let Some(name) = name.filter(|n| n.len() <= GOVERNOR_ARG_MAX) else {
            return Err(CpufreqError::InvalidArgument(
                "governor name missing or longer than 19 bytes",
            ));
        };
        self.check_bounds(id)?;
        self.require_elevated("modify_policy_governor", id)?;
        self.registry.get_mut(id)?.set_policy_governor(name);
        debug!("unit {id}: governor set to {name}");
        Ok(())
    }

    /// Set the current frequency, unless a fault is already stored there.
    pub fn set_frequency(&mut self, id: UnitId, target: u64) -> Result<()> {
        self.check_bounds(id)?;
        self.require_elevated("set_frequency", id)?;
        let record = self.registry.get_mut(id)?;
        record.frequency.read()?;
        record.frequency.write(target);
        debug!("unit {id}: frequency set to {target}");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::StaticBackend;
    use crate::privilege::Principal;
    use crate::registry::Registry;
    use crate::scalar::{Fault, Scalar};

    fn controller(principal: Principal) -> Controller {
        Controller::new(Registry::reference(), StaticBackend::reference(2), principal)
    }

    #[test]
    fn test_set_frequency_roundtrip() {
        let mut c = controller(Principal::Elevated);
        c.set_frequency(0, 800_000).unwrap();
        assert_eq!(c.frequency_reported(0), Ok(800_000));
    }

    #[test]
    fn test_set_frequency_keeps_stored_fault() {
        let mut c = controller(Principal::Elevated);
        assert_eq!(
            c.set_frequency(1, 800_000),
            Err(CpufreqError::Fault(Fault::ACCESS_DENIED))
        );
        assert_eq!(
            c.registry().get(1).unwrap().frequency,
            Scalar::Fault(Fault::ACCESS_DENIED)
        );
    }

    #[test]
    fn test_set_policy() {
        let mut c = controller(Principal::Elevated);
        c.set_policy(0, Some(&Policy::new(200_000, 900_000, "powersave")))
            .unwrap();
        let snapshot = c.policy(0).unwrap();
        assert_eq!((snapshot.min, snapshot.max), (200_000, 900_000));
        assert_eq!(snapshot.governor, "powersave");
    }

    #[test]
    fn test_set_policy_argument_checked_before_bounds() {
        let mut c = controller(Principal::Unprivileged);
        let empty = Policy::new(1, 2, "");
        assert!(matches!(
            c.set_policy(42, None),
            Err(CpufreqError::InvalidArgument(_))
        ));
        assert!(matches!(
            c.set_policy(42, Some(&empty)),
            Err(CpufreqError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_set_policy_on_faulted_unit() {
        let mut c = controller(Principal::Elevated);
        let before = c.registry().get(1).unwrap().clone();
        assert_eq!(
            c.set_policy(1, Some(&Policy::new(1, 2, "ondemand"))),
            Err(CpufreqError::Fault(Fault::ACCESS_DENIED))
        );
        assert_eq!(c.registry().get(1).unwrap(), &before);
    }

    #[test]
    fn test_modify_min_max_overwrite_faults() {
        let mut c = controller(Principal::Elevated);
        c.modify_policy_min(1, 100).unwrap();
        c.modify_policy_max(1, 200).unwrap();
        let snapshot = c.policy(1).unwrap();
        assert_eq!((snapshot.min, snapshot.max), (100, 200));
        assert_eq!(snapshot.governor, "a");
    }

    #[test]
    fn test_modify_governor_length_limit() {
        let mut c = controller(Principal::Elevated);
        let long = "x".repeat(20);
        for id in [0, 1, 2, 1000] {
            assert!(matches!(
                c.modify_policy_governor(id, Some(long.as_str())),
                Err(CpufreqError::InvalidArgument(_))
            ));
        }
        assert!(matches!(
            c.modify_policy_governor(0, None),
            Err(CpufreqError::InvalidArgument(_))
        ));

        let exact = "y".repeat(19);
        c.modify_policy_governor(0, Some(exact.as_str())).unwrap();
        assert_eq!(c.policy(0).unwrap().governor, exact);
    }

    #[test]
    fn test_out_of_range_is_not_found() {
        let mut c = controller(Principal::Elevated);
        assert_eq!(c.set_frequency(2, 1), Err(CpufreqError::NotFound { id: 2 }));
        assert_eq!(c.modify_policy_min(2, 1), Err(CpufreqError::NotFound { id: 2 }));
        assert_eq!(c.modify_policy_max(2, 1), Err(CpufreqError::NotFound { id: 2 }));
        assert_eq!(
            c.modify_policy_governor(2, Some("powersave")),
            Err(CpufreqError::NotFound { id: 2 })
        );
        assert_eq!(
            c.set_policy(2, Some(&Policy::new(1, 2, "powersave"))),
            Err(CpufreqError::NotFound { id: 2 })
        );
    }

    #[test]
    fn test_unprivileged_mutations_leave_record_unchanged() {
        let mut c = controller(Principal::Unprivileged);
        let before = c.registry().clone();

        assert_eq!(c.set_frequency(0, 1), Err(CpufreqError::PermissionDenied));
        assert_eq!(c.modify_policy_min(0, 1), Err(CpufreqError::PermissionDenied));
        assert_eq!(c.modify_policy_max(0, 1), Err(CpufreqError::PermissionDenied));
        assert_eq!(
            c.modify_policy_governor(0, Some("userspace")),
            Err(CpufreqError::PermissionDenied)
        );
        assert_eq!(
            c.set_policy(0, Some(&Policy::new(1, 2, "userspace"))),
            Err(CpufreqError::PermissionDenied)
        );

        assert_eq!(c.registry(), &before);
    }
}
