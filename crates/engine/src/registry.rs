use crate::{
    DevelopmentService, DomainService, EngineError, MarketService, OrganizationService,
    RandomSource, SalesService, ServiceRuntime, TreasuryService,
};
use crate::service::Domain;
use std::fmt;
use std::str::FromStr;

/// The services a host can run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceKind {
    Treasury,
    Organization,
    Development,
    Market,
    Sales,
}

impl ServiceKind {
    pub const ALL: [ServiceKind; 5] = [
        ServiceKind::Treasury,
        ServiceKind::Organization,
        ServiceKind::Development,
        ServiceKind::Market,
        ServiceKind::Sales,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Self::Treasury => TreasuryService::NAME,
            Self::Organization => OrganizationService::NAME,
            Self::Development => DevelopmentService::NAME,
            Self::Market => MarketService::NAME,
            Self::Sales => SalesService::NAME,
        }
    }

    pub const fn description(self) -> &'static str {
        match self {
            Self::Treasury => TreasuryService::DESCRIPTION,
            Self::Organization => OrganizationService::DESCRIPTION,
            Self::Development => DevelopmentService::DESCRIPTION,
            Self::Market => MarketService::DESCRIPTION,
            Self::Sales => SalesService::DESCRIPTION,
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(name.trim()))
    }

    /// Build an uninitialized service. Services without randomized
    /// policies drop the source.
    pub fn instantiate(self, random: Box<dyn RandomSource>) -> Box<dyn DomainService> {
        match self {
            Self::Treasury => Box::new(ServiceRuntime::new(TreasuryService::new(random))),
            Self::Organization => Box::new(ServiceRuntime::new(OrganizationService::new(random))),
            Self::Development => Box::new(ServiceRuntime::new(DevelopmentService::new())),
            Self::Market => Box::new(ServiceRuntime::new(MarketService::new())),
            Self::Sales => Box::new(ServiceRuntime::new(SalesService::new(random))),
        }
    }
}

impl fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ServiceKind {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| EngineError::UnknownService(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FastRandSource;

    #[test]
    fn test_names_round_trip() {
        for kind in ServiceKind::ALL {
            assert_eq!(kind.name().parse::<ServiceKind>().unwrap(), kind);
            assert_eq!(kind.to_string(), kind.name());
        }
        assert_eq!(ServiceKind::from_name(" Treasury "), Some(ServiceKind::Treasury));
        assert!(matches!(
            "gateway".parse::<ServiceKind>(),
            Err(EngineError::UnknownService(_))
        ));
    }

    #[test]
    fn test_instantiate_uninitialized() {
        for kind in ServiceKind::ALL {
            let service = kind.instantiate(Box::new(FastRandSource::seeded(1)));
            assert_eq!(service.name(), kind.name());
            assert!(!service.health().initialized);
            assert!(!service.message_types().is_empty());
        }
    }
}
