//! Read-only operations on a [`Controller`].

use log::debug;

use crate::UnitId;
use crate::backend::Backend;
use crate::constants::AVAILABLE_GOVERNORS;
use crate::controller::Controller;
use crate::error::{CpufreqError, Result};
use crate::list::{ListBuilder, OwnedList};
use crate::policy::PolicySnapshot;
use crate::stat::Stat;

impl<B: Backend> Controller<B> {
    /// Frequency as reported by the kernel. No privilege required.
    pub fn frequency_reported(&self, id: UnitId) -> Result<u64> {
        self.check_bounds(id)?;
        Ok(self.registry.get(id)?.frequency.read()?)
    }

    /// Frequency as measured by the hardware. Elevated callers only.
    pub fn frequency_measured(&self, id: UnitId) -> Result<u64> {
        self.check_bounds(id)?;
        self.require_elevated("frequency_measured", id)?;
        self.frequency_reported(id)
    }

    /// Hardware measurement first, kernel report if that fails.
    pub fn frequency(&self, id: UnitId) -> Result<u64> {
        self.frequency_measured(id).or_else(|e| {
            debug!("unit {id}: measured frequency unavailable ({e}), using reported");
            self.frequency_reported(id)
        })
    }

    pub fn transition_latency(&self, id: UnitId) -> Result<u64> {
        self.check_bounds(id)?;
        Ok(self.registry.get(id)?.transition_latency.read()?)
    }

    /// Write the hardware limits through both output slots.
    ///
    /// Both slots must be present; nothing is written unless both limits are valid.
    pub fn hardware_limits_into(
        &self,
        id: UnitId,
        out_min: Option<&mut u64>,
        out_max: Option<&mut u64>,
    ) -> Result<()> {
        let (Some(out_min), Some(out_max)) = (out_min, out_max) else {
            return Err(CpufreqError::InvalidArgument("missing output slot"));
        };
        self.check_bounds(id)?;

        let (min, max) = self.registry.get(id)?.limits;
        let min = min.read()?;
        let max = max.read()?;
        *out_min = min;
        *out_max = max;
        Ok(())
    }

    pub fn hardware_limits(&self, id: UnitId) -> Result<(u64, u64)> {
        let (mut min, mut max) = (0, 0);
        self.hardware_limits_into(id, Some(&mut min), Some(&mut max))?;
        Ok((min, max))
    }

    /// Caller-owned copy of the unit's policy, released with `release_policy`.
    pub fn policy(&self, id: UnitId) -> Result<PolicySnapshot> {
        self.check_bounds(id)?;
        let record = self.registry.get(id)?;
        let min = record.policy_min.read()?;
        let max = record.policy_max.read()?;
        PolicySnapshot::try_new(min, max, record.policy_governor())
    }

    /// The fixed governor list, independent of the unit's state.
    pub fn available_governors(&self, id: UnitId) -> Result<OwnedList<String>> {
        self.check_bounds(id)?;
        let mut builder = ListBuilder::new();
        for name in AVAILABLE_GOVERNORS {
            let mut node = String::new();
            node.try_reserve_exact(name.len())?;
            node.push_str(name);
            builder.push(node)?;
        }
        Ok(builder.finish())
    }

    pub fn driver_name(&self, id: UnitId) -> Result<String> {
        self.check_bounds(id)?;
        self.backend.driver_name(id)
    }

    pub fn available_frequencies(&self, id: UnitId) -> Result<OwnedList<u64>> {
        self.check_bounds(id)?;
        self.backend.available_frequencies(id)
    }

    /// Units whose frequency is set together with this one.
    pub fn affected_units(&self, id: UnitId) -> Result<OwnedList<UnitId>> {
        self.check_bounds(id)?;
        self.backend.affected_units(id)
    }

    /// Units sharing the frequency domain, in hardware or software.
    pub fn related_units(&self, id: UnitId) -> Result<OwnedList<UnitId>> {
        self.check_bounds(id)?;
        self.backend.related_units(id)
    }

    /// Per-frequency time accounting, plus the total time over all entries.
    pub fn stats(&self, id: UnitId) -> Result<(OwnedList<Stat>, u64)> {
        self.check_bounds(id)?;
        self.backend.stats(id)
    }

    pub fn transition_count(&self, id: UnitId) -> Result<u64> {
        self.check_bounds(id)?;
        self.backend.transition_count(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::StaticBackend;
    use crate::list::release_list;
    use crate::policy::release_policy;
    use crate::privilege::Principal;
    use crate::registry::Registry;
    use crate::scalar::Fault;

    fn controller(principal: Principal) -> Controller {
        Controller::new(Registry::reference(), StaticBackend::reference(2), principal)
    }

    #[test]
    fn test_reported_frequency() {
        let c = controller(Principal::Unprivileged);
        assert_eq!(c.frequency_reported(0), Ok(2_400_000));
        assert_eq!(
            c.frequency_reported(1),
            Err(CpufreqError::Fault(Fault::ACCESS_DENIED))
        );
    }

    #[test]
    fn test_measured_frequency_requires_privilege() {
        assert_eq!(
            controller(Principal::Unprivileged).frequency_measured(0),
            Err(CpufreqError::PermissionDenied)
        );
        assert_eq!(controller(Principal::Elevated).frequency_measured(0), Ok(2_400_000));
    }

    #[test]
    fn test_frequency_falls_back_to_reported() {
        assert_eq!(controller(Principal::Unprivileged).frequency(0), Ok(2_400_000));
        assert_eq!(
            controller(Principal::Elevated).frequency(1),
            Err(CpufreqError::Fault(Fault::ACCESS_DENIED))
        );
    }

    #[test]
    fn test_hardware_limits() {
        let c = controller(Principal::Unprivileged);
        assert_eq!(c.hardware_limits(0), Ok((100_000, 1_000_000)));
        assert_eq!(
            c.hardware_limits(1),
            Err(CpufreqError::Fault(Fault::ACCESS_DENIED))
        );
    }

    #[test]
    fn test_hardware_limits_missing_slot_writes_nothing() {
        let c = controller(Principal::Unprivileged);
        let mut slot = 7u64;
        assert_eq!(
            c.hardware_limits_into(0, None, Some(&mut slot)),
            Err(CpufreqError::InvalidArgument("missing output slot"))
        );
        assert_eq!(
            c.hardware_limits_into(0, Some(&mut slot), None),
            Err(CpufreqError::InvalidArgument("missing output slot"))
        );
        assert_eq!(slot, 7);
    }

    #[test]
    fn test_policy_snapshot_is_independent() {
        let c = controller(Principal::Unprivileged);
        let mut snapshot = c.policy(0).unwrap();
        assert_eq!(snapshot.governor, "performance");
        snapshot.governor.push_str("-changed");
        snapshot.min = 0;
        release_policy(Some(snapshot));

        let again = c.policy(0).unwrap();
        assert_eq!(again.governor, "performance");
        assert_eq!(again.min, 100_000);
    }

    #[test]
    fn test_faulted_frequency_does_not_block_other_fields() {
        let mut registry = Registry::reference();
        registry.get_mut(0).unwrap().frequency = Fault::IO.into();
        let c = Controller::new(registry, StaticBackend::reference(2), Principal::Elevated);
        assert_eq!(c.frequency_reported(0), Err(CpufreqError::Fault(Fault::IO)));
        assert_eq!(c.policy(0).unwrap().max, 1_000_000);
        assert_eq!(c.transition_latency(0), Ok(1000));
    }

    #[test]
    fn test_available_governors_fixed_order() {
        let c = controller(Principal::Unprivileged);
        for id in c.units() {
            let list = c.available_governors(id).unwrap();
            assert_eq!(
                list.as_slice(),
                &["conservative", "ondemand", "powersave", "userspace", "performance"]
            );
            assert_eq!(release_list(Some(list)), 5);
        }
    }

    #[test]
    fn test_backend_queries_are_bounds_checked() {
        let c = controller(Principal::Unprivileged);
        assert_eq!(c.driver_name(2), Err(CpufreqError::NotFound { id: 2 }));
        assert_eq!(c.stats(9).map(|_| ()), Err(CpufreqError::NotFound { id: 9 }));
        assert_eq!(c.related_units(1).unwrap().as_slice(), &[1]);
        assert_eq!(c.transition_count(0), Ok(0));
    }
}
