#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    #[default]
    Asc,
    Desc,
}

/// Ordering key of an `ORDER BY` modifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ordered {
    pub field: String,
    pub order: Order,
}

impl From<&str> for Ordered {
    fn from(value: &str) -> Self {
        Ordered {
            field: value.into(),
            order: Order::Asc,
        }
    }
}

impl From<(&str, Order)> for Ordered {
    fn from((field, order): (&str, Order)) -> Self {
        Ordered {
            field: field.into(),
            order,
        }
    }
}
