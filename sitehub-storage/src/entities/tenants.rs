//! Tenant entity: one row per customer organization in the control plane

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::Set;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "tenants")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    pub company_name: String,
    #[sea_orm(unique)]
    pub tenant_key: String,
    #[sea_orm(unique)]
    pub db_name: String,
    #[sea_orm(unique)]
    pub subdomain: String,
    pub preferred_subdomain: Option<String>,
    #[sea_orm(unique)]
    pub email: String,
    pub phone: String,
    /// bcrypt hash, never serialized
    #[serde(skip_serializing, default)]
    pub password: String,
    pub image: Option<String>,
    pub db_url: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Model {
    /// Soft-deleted rows stay in the table but are invisible to lookups
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::domains::Entity")]
    Domains,
}

impl Related<super::domains::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Domains.def()
    }
}

impl ActiveModelBehavior for ActiveModel {
    fn new() -> Self {
        Self {
            is_active: Set(true),
            created_at: Set(Utc::now()),
            updated_at: Set(Utc::now()),
            ..ActiveModelTrait::default()
        }
    }
}
