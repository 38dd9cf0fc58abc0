//! # clickhousedbops
//!
//! Declarative management of ClickHouse access control: users, roles,
//! settings profiles and their settings, role and privilege grants, and
//! databases.
//!
//! A host configures a [`Provider`](provider::Provider) from
//! [`Settings`](settings::Settings), then drives each object through the
//! [`framework`] lifecycle. Resources translate their models into
//! [`dbops`] calls, which render SQL with the [`querybuilder`] and run it
//! through the [`infrastructure::clickhouse`] client.

pub mod datasources;
pub mod dbops;
pub mod framework;
pub mod infrastructure;
pub mod logger;
pub mod provider;
pub mod querybuilder;
pub mod resources;
pub mod settings;
