//! Dashboard tab listings
//!
//! Read-only collections shown on the dashboard tabs. Records keep the
//! fields the console displays and carry anything else the backend adds in
//! `extra`, so a new backend column does not break decoding.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::or_log;
use crate::client::ApiClient;
use crate::envelope::{decode_page, Page, PageQuery};

/// Dashboard tabs, in display order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Tab {
    #[default]
    LicensePlates,
    Events,
    Vehicles,
    Drivers,
    Cameras,
}

impl Tab {
    pub const ALL: [Tab; 5] = [
        Tab::LicensePlates,
        Tab::Events,
        Tab::Vehicles,
        Tab::Drivers,
        Tab::Cameras,
    ];

    /// Backend collection path
    pub fn path(&self) -> &'static str {
        match self {
            Tab::LicensePlates => "/license-plates",
            Tab::Events => "/events",
            Tab::Vehicles => "/vehicles",
            Tab::Drivers => "/drivers",
            Tab::Cameras => "/cameras",
        }
    }

    pub fn slug(&self) -> &'static str {
        &self.path()[1..]
    }

    pub fn label(&self) -> &'static str {
        match self {
            Tab::LicensePlates => "License Plates",
            Tab::Events => "Events",
            Tab::Vehicles => "Vehicles",
            Tab::Drivers => "Drivers",
            Tab::Cameras => "Cameras",
        }
    }

    pub fn from_slug(slug: &str) -> Option<Self> {
        Tab::ALL.into_iter().find(|tab| tab.slug() == slug)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LicensePlate {
    pub id: i64,
    #[serde(default, alias = "plateNumber")]
    pub plate_number: Option<String>,
    #[serde(default)]
    pub confidence: Option<f64>,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: i64,
    #[serde(default, alias = "eventType", alias = "type")]
    pub event_type: Option<String>,
    #[serde(default, alias = "cameraId")]
    pub camera_id: Option<i64>,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vehicle {
    pub id: i64,
    #[serde(default, alias = "plateNumber")]
    pub plate_number: Option<String>,
    #[serde(default)]
    pub make: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Driver {
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, alias = "licenseNumber")]
    pub license_number: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Clone)]
pub struct ListingService {
    client: ApiClient,
}

impl ListingService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn license_plates(&self, query: Option<PageQuery>) -> Page<LicensePlate> {
        self.fetch(Tab::LicensePlates, query).await
    }

    pub async fn events(&self, query: Option<PageQuery>) -> Page<Event> {
        self.fetch(Tab::Events, query).await
    }

    pub async fn vehicles(&self, query: Option<PageQuery>) -> Page<Vehicle> {
        self.fetch(Tab::Vehicles, query).await
    }

    pub async fn drivers(&self, query: Option<PageQuery>) -> Page<Driver> {
        self.fetch(Tab::Drivers, query).await
    }

    pub async fn cameras(&self, query: Option<PageQuery>) -> Page<Camera> {
        self.fetch(Tab::Cameras, query).await
    }

    /// Any tab as plain JSON rows, for generic table rendering
    pub async fn tab_rows(&self, tab: Tab, query: Option<PageQuery>) -> Page<Value> {
        fn rows<T: Serialize>(page: Page<T>) -> Page<Value> {
            page.map(|item| serde_json::to_value(item).unwrap_or(Value::Null))
        }
        match tab {
            Tab::LicensePlates => rows(self.license_plates(query).await),
            Tab::Events => rows(self.events(query).await),
            Tab::Vehicles => rows(self.vehicles(query).await),
            Tab::Drivers => rows(self.drivers(query).await),
            Tab::Cameras => rows(self.cameras(query).await),
        }
    }

    async fn fetch<T: DeserializeOwned>(&self, tab: Tab, query: Option<PageQuery>) -> Page<T> {
        let result = async {
            let raw = match query {
                Some(q) => self.client.get_query(tab.path(), &q).await?,
                None => self.client.get(tab.path()).await?,
            };
            decode_page::<T>(raw, &[])
        }
        .await;
        or_log(result, &format!("fetch {}", tab.slug())).unwrap_or_default()
    }
}
