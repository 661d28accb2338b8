use crate::domain::layout::GridLayout;
use crate::domain::model::{
    AllergensSheet, Archive, DayDocuments, DayMenu, DaySelection, FieldMap, LoadResult,
    TransformResult, Variant, WeeklyMenu,
};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

/// Locations of the three document templates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplatePaths {
    pub standard: String,
    pub vegan: String,
    pub allergens: String,
}

impl TemplatePaths {
    pub fn for_variant(&self, variant: Variant) -> &str {
        match variant {
            Variant::Standard => &self.standard,
            Variant::Vegan => &self.vegan,
        }
    }
}

pub trait ConfigProvider: Send + Sync {
    fn weekly_path(&self) -> &str;
    fn output_path(&self) -> &str;
    fn templates(&self) -> TemplatePaths;
    fn selection(&self) -> DaySelection;
    fn bundle(&self) -> bool;
    fn proper_nouns(&self) -> &[String];
    fn grid_layout(&self) -> &GridLayout;
    fn banner_marker(&self) -> Option<&str>;
}

/// Fills document templates. Must leave template styling untouched.
pub trait DocumentRenderer: Send + Sync {
    fn render_menu(&self, template_name: &str, template: &[u8], fields: &FieldMap) -> Result<Vec<u8>>;
    fn render_allergens(
        &self,
        template_name: &str,
        template: &[u8],
        sheet: &AllergensSheet,
    ) -> Result<Vec<u8>>;
}

/// Bundles a day's documents into one distributable archive.
pub trait Packager: Send + Sync {
    fn package(&self, day: &DayMenu, documents: &DayDocuments) -> Result<Archive>;
    fn bundle(&self, first_day: &DayMenu, archives: &[Archive]) -> Result<Archive>;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<WeeklyMenu>;
    async fn transform(&self, week: &WeeklyMenu) -> Result<TransformResult>;
    async fn load(&self, week: &WeeklyMenu, result: TransformResult) -> Result<LoadResult>;
    /// Resolved fields and allergens rows of the selected days, nothing written.
    async fn preview(&self, week: &WeeklyMenu) -> Result<serde_json::Value>;
}
