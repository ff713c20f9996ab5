//! Who is asking.

use crate::domain::{CompanyId, RegionId, Trip};

use super::error::ReconcileError;

/// Role of the authenticated caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Admin,
    Manager,
    Organizer,
    Dispatcher,
}

/// Identity context of a lifecycle call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    /// Organizer company of managers and organizers.
    pub company: Option<CompanyId>,
    pub role: Role,
    /// Regions a dispatcher serves.
    pub regions: Vec<RegionId>,
}

impl Caller {
    pub fn admin() -> Self {
        Self {
            company: None,
            role: Role::Admin,
            regions: Vec::new(),
        }
    }

    pub fn organizer(company: CompanyId) -> Self {
        Self {
            company: Some(company),
            role: Role::Organizer,
            regions: Vec::new(),
        }
    }

    pub fn manager(company: CompanyId) -> Self {
        Self {
            company: Some(company),
            role: Role::Manager,
            regions: Vec::new(),
        }
    }

    pub fn dispatcher(regions: Vec<RegionId>) -> Self {
        Self {
            company: None,
            role: Role::Dispatcher,
            regions,
        }
    }

    /// Whether the caller may book, cancel or move passengers on `trip`.
    pub fn can_manage(&self, trip: &Trip) -> bool {
        match self.role {
            Role::Admin => true,
            Role::Manager | Role::Organizer => self.company == Some(trip.organizer_company),
            Role::Dispatcher => false,
        }
    }

    /// Whether the caller may run `trip` (status, driver, price).
    pub fn can_dispatch(&self, trip: &Trip) -> bool {
        match self.role {
            Role::Admin => true,
            Role::Dispatcher => trip.region.is_some_and(|r| self.regions.contains(&r)),
            _ => false,
        }
    }

    pub(crate) fn ensure_manages(&self, trip: &Trip) -> Result<(), ReconcileError> {
        if self.can_manage(trip) {
            Ok(())
        } else {
            Err(ReconcileError::AccessDenied(format!(
                "{:?} may not manage trips of {}",
                self.role, trip.organizer_company
            )))
        }
    }

    pub(crate) fn ensure_dispatches(&self, trip: &Trip) -> Result<(), ReconcileError> {
        if self.can_dispatch(trip) {
            Ok(())
        } else {
            Err(ReconcileError::AccessDenied(format!(
                "{:?} may not dispatch this trip",
                self.role
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Location, PickupTime, ShipId};

    fn trip() -> Trip {
        let pickup = PickupTime::parse("2024-06-01 09:00").unwrap();
        let mut trip = Trip::new(
            CompanyId(1),
            ShipId(1),
            pickup,
            Location::named("Pier A"),
            Location::named("Downtown"),
            pickup.to_datetime(),
        );
        trip.region = Some(RegionId(3));
        trip
    }

    #[test]
    fn organizers_manage_own_company_only() {
        assert!(Caller::organizer(CompanyId(1)).can_manage(&trip()));
        assert!(Caller::manager(CompanyId(1)).can_manage(&trip()));
        assert!(!Caller::organizer(CompanyId(2)).can_manage(&trip()));
        assert!(Caller::admin().can_manage(&trip()));
        assert!(!Caller::dispatcher(vec![RegionId(3)]).can_manage(&trip()));
    }

    #[test]
    fn dispatchers_act_in_their_regions() {
        assert!(Caller::dispatcher(vec![RegionId(3)]).can_dispatch(&trip()));
        assert!(!Caller::dispatcher(vec![RegionId(4)]).can_dispatch(&trip()));
        assert!(!Caller::organizer(CompanyId(1)).can_dispatch(&trip()));

        let mut no_region = trip();
        no_region.region = None;
        assert!(!Caller::dispatcher(vec![RegionId(3)]).can_dispatch(&no_region));
    }

    #[test]
    fn ensure_manages_is_access_denied() {
        let err = Caller::organizer(CompanyId(2)).ensure_manages(&trip()).unwrap_err();
        assert!(matches!(err, ReconcileError::AccessDenied(_)));
    }
}
