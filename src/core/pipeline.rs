use crate::adapters::docx;
use crate::core::allergens::AllergensComposer;
use crate::core::generate::generate;
use crate::core::grid::GridParser;
use crate::core::rules::RuleEngine;
use crate::core::{ConfigProvider, Pipeline, Storage, TransformResult};
use crate::domain::model::{DayArtifacts, DayDocuments, LoadResult, RenderedDay, WeeklyMenu};
use crate::domain::ports::{DocumentRenderer, Packager, TemplatePaths};
use crate::utils::error::{DayFailure, MenuError, Result};
use serde_json::json;
use std::path::Path;

/// Template bytes, read once per run.
struct Templates {
    paths: TemplatePaths,
    standard: Vec<u8>,
    vegan: Vec<u8>,
    allergens: Vec<u8>,
}

fn display_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string())
}

pub struct MenuPipeline<S: Storage, C: ConfigProvider, R: DocumentRenderer, P: Packager> {
    storage: S,
    config: C,
    renderer: R,
    packager: P,
    engine: RuleEngine,
    composer: AllergensComposer,
}

impl<S: Storage, C: ConfigProvider, R: DocumentRenderer, P: Packager> MenuPipeline<S, C, R, P> {
    pub fn new(storage: S, config: C, renderer: R, packager: P) -> Self {
        let engine = RuleEngine::new(config.proper_nouns().to_vec());
        Self {
            storage,
            config,
            renderer,
            packager,
            engine,
            composer: AllergensComposer::new(),
        }
    }

    async fn read_templates(&self) -> Result<Templates> {
        let paths = self.config.templates();
        tracing::debug!("Reading templates: {:?}", paths);
        Ok(Templates {
            standard: self.storage.read_file(&paths.standard).await?,
            vegan: self.storage.read_file(&paths.vegan).await?,
            allergens: self.storage.read_file(&paths.allergens).await?,
            paths,
        })
    }

    fn render_day(&self, templates: &Templates, artifacts: &DayArtifacts) -> Result<DayDocuments> {
        let standard = self.renderer.render_menu(
            &display_name(&templates.paths.standard),
            &templates.standard,
            &artifacts.standard.fields,
        )?;
        let vegan = self.renderer.render_menu(
            &display_name(&templates.paths.vegan),
            &templates.vegan,
            &artifacts.vegan.fields,
        )?;
        let allergens = self.renderer.render_allergens(
            &display_name(&templates.paths.allergens),
            &templates.allergens,
            &artifacts.allergens,
        )?;
        Ok(DayDocuments {
            standard,
            vegan,
            allergens,
        })
    }

    fn output_file(&self, name: &str) -> String {
        format!("{}/{}", self.config.output_path().trim_end_matches('/'), name)
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider, R: DocumentRenderer, P: Packager> Pipeline
    for MenuPipeline<S, C, R, P>
{
    async fn extract(&self) -> Result<WeeklyMenu> {
        let weekly_path = self.config.weekly_path();
        tracing::debug!("Reading weekly grid from: {}", weekly_path);
        let bytes = self.storage.read_file(weekly_path).await?;

        let grid = docx::read_grid(&bytes)?;
        let week = GridParser::new(self.config.grid_layout().clone()).parse(&grid)?;
        tracing::debug!(
            "Weekly grid covers {} days starting {}",
            week.days().len(),
            week.days().first().map(|d| d.date.to_string()).unwrap_or_default()
        );
        Ok(week)
    }

    async fn transform(&self, week: &WeeklyMenu) -> Result<TransformResult> {
        let results = generate(week, self.config.selection(), &self.engine, &self.composer)?;
        let templates = self.read_templates().await?;

        let mut outcome = TransformResult::default();
        for result in results {
            let artifacts = match result {
                Ok(artifacts) => artifacts,
                Err(failure) => {
                    outcome.failures.push(failure);
                    continue;
                }
            };

            match self.render_day(&templates, &artifacts) {
                Ok(documents) => {
                    tracing::debug!("Rendered documents for {} {}", artifacts.weekday, artifacts.date);
                    outcome.rendered.push(RenderedDay {
                        artifacts,
                        documents,
                    });
                }
                // 模板不符只影響當天，其他錯誤中止整次執行
                Err(source @ MenuError::TemplateMismatch(_)) => {
                    tracing::warn!("⚠️ {} {} skipped: {}", artifacts.weekday, artifacts.date, source);
                    outcome.failures.push(DayFailure {
                        date: artifacts.date,
                        weekday: artifacts.weekday.clone(),
                        source,
                    });
                }
                Err(e) => return Err(e),
            }
        }

        outcome.failures.sort_by_key(|f| f.date);
        Ok(outcome)
    }

    async fn load(&self, week: &WeeklyMenu, result: TransformResult) -> Result<LoadResult> {
        let mut archives = Vec::new();
        let mut written = Vec::new();

        for rendered in &result.rendered {
            let Some(day) = week.day(rendered.artifacts.date) else {
                continue;
            };
            let archive = self.packager.package(day, &rendered.documents)?;
            let path = self.output_file(&archive.name);
            tracing::debug!("Writing {} ({} bytes)", path, archive.bytes.len());
            self.storage.write_file(&path, &archive.bytes).await?;
            written.push(path);
            archives.push(archive);
        }

        if self.config.bundle() && !archives.is_empty() {
            let first_day = result
                .rendered
                .first()
                .and_then(|r| week.day(r.artifacts.date));
            if let Some(first_day) = first_day {
                let bundle = self.packager.bundle(first_day, &archives)?;
                let path = self.output_file(&bundle.name);
                self.storage.write_file(&path, &bundle.bytes).await?;
                written.push(path);
            }
        }

        Ok(LoadResult {
            archives: written,
            failures: result.failures,
        })
    }

    async fn preview(&self, week: &WeeklyMenu) -> Result<serde_json::Value> {
        let results = generate(week, self.config.selection(), &self.engine, &self.composer)?;
        let mut days = Vec::new();
        let mut failures = Vec::new();
        for result in results {
            match result {
                Ok(artifacts) => days.push(serde_json::to_value(&artifacts)?),
                Err(failure) => failures.push(json!({
                    "date": failure.date,
                    "weekday": failure.weekday,
                    "error": failure.source.to_string(),
                })),
            }
        }
        Ok(json!({ "days": days, "failures": failures }))
    }
}
