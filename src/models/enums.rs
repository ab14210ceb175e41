use crate::db::DatabaseError;
use serde::{Deserialize, Serialize};

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = DatabaseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(DatabaseError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }
    };
}

str_enum!(ReportStatus {
    Pending => "pending",
    Processing => "processing",
    Completed => "completed",
    Failed => "failed",
});

impl ReportStatus {
    /// Terminal states accept no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// The lifecycle is a straight line with two exits:
    /// pending → processing → completed | failed.
    pub fn can_transition_to(&self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Processing)
                | (Self::Processing, Self::Completed)
                | (Self::Processing, Self::Failed)
        )
    }
}

str_enum!(SubscriptionStatus {
    Active => "active",
    PastDue => "past_due",
    Canceled => "canceled",
});

impl SubscriptionStatus {
    /// Clinic entitlements are on/off — an active subscription is the switch.
    pub fn entitled(&self) -> bool {
        matches!(self, Self::Active)
    }
}

str_enum!(SpecimenType {
    Serum => "serum",
    WholeBlood => "whole_blood",
    Urine => "urine",
    Saliva => "saliva",
    Stool => "stool",
});

str_enum!(OrderStatus {
    Created => "created",
    Paid => "paid",
});

str_enum!(DispensaryAccountType {
    Patient => "patient",
    Practitioner => "practitioner",
});
