// Domain layer: menu data model, the grid layout table and ports (interfaces).

pub mod layout;
pub mod model;
pub mod ports;
