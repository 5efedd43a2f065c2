use crate::error::{Error, Result};
use crate::llm::LlmClient;
use crate::template::TemplateStore;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub const CHAPTER_COUNT: usize = 2;

const STAGE_IDEA: &str = "idea";
const STAGE_OUTLINE: &str = "outline";
const STAGE_PLOT: &str = "plot";
const STAGE_CHAPTER: &str = "chapter";

/// Input for one generation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    pub genre: String,
    pub characters: Vec<Character>,
    pub news_text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Character {
    pub name: String,
    pub role: String,
}

impl GenerationRequest {
    pub fn validate(&self) -> Result<()> {
        if self.genre.trim().is_empty() {
            return Err(Error::Validation("genre must not be empty".to_string()));
        }
        if self.characters.is_empty() {
            return Err(Error::Validation(
                "at least one character is required".to_string(),
            ));
        }
        if self.characters.iter().any(|c| c.name.trim().is_empty()) {
            return Err(Error::Validation(
                "character names must not be empty".to_string(),
            ));
        }
        if self.news_text.trim().is_empty() {
            return Err(Error::Validation("newsText must not be empty".to_string()));
        }
        Ok(())
    }
}

/// Per-run accumulation of stage outputs. Fields that have not been
/// produced yet are omitted from the render context, so a template
/// referencing a later stage fails loudly instead of filling in nothing.
#[derive(Debug, Serialize)]
struct PipelineContext {
    genre: String,
    characters: String,
    news_text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    novel_idea: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    novel_outline: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    novel_plot: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    chapter_number: Option<usize>,
}

impl PipelineContext {
    fn new(req: &GenerationRequest) -> Self {
        let characters = req
            .characters
            .iter()
            .map(|c| format!("{} - {}", c.name, c.role))
            .collect::<Vec<_>>()
            .join("\n");
        Self {
            genre: req.genre.clone(),
            characters,
            news_text: req.news_text.clone(),
            novel_idea: None,
            novel_outline: None,
            novel_plot: None,
            chapter_number: None,
        }
    }
}

/// Runs the fixed idea -> outline -> plot -> chapters sequence, one
/// service call per stage, each stage rendered from all prior outputs.
pub struct PipelineRunner {
    templates: Arc<TemplateStore>,
    llm: Arc<dyn LlmClient>,
}

impl PipelineRunner {
    pub fn new(templates: Arc<TemplateStore>, llm: Arc<dyn LlmClient>) -> Self {
        Self { templates, llm }
    }

    pub async fn run(&self, req: &GenerationRequest) -> Result<String> {
        req.validate()?;

        // All templates must exist before the first network call is issued.
        let idea_template = self.templates.load(STAGE_IDEA)?;
        let outline_template = self.templates.load(STAGE_OUTLINE)?;
        let plot_template = self.templates.load(STAGE_PLOT)?;
        let chapter_template = self.templates.load(STAGE_CHAPTER)?;

        let mut context = PipelineContext::new(req);

        log::info!("pipeline stage: {}", STAGE_IDEA);
        let prompt = idea_template.render(&context)?;
        context.novel_idea = Some(self.llm.chat("", &prompt).await?);

        log::info!("pipeline stage: {}", STAGE_OUTLINE);
        let prompt = outline_template.render(&context)?;
        context.novel_outline = Some(self.llm.chat("", &prompt).await?);

        log::info!("pipeline stage: {}", STAGE_PLOT);
        let prompt = plot_template.render(&context)?;
        context.novel_plot = Some(self.llm.chat("", &prompt).await?);

        let mut chapters = Vec::with_capacity(CHAPTER_COUNT);
        for chapter_number in 1..=CHAPTER_COUNT {
            log::info!("pipeline stage: {} {}", STAGE_CHAPTER, chapter_number);
            context.chapter_number = Some(chapter_number);
            let prompt = chapter_template.render(&context)?;
            chapters.push(self.llm.chat("", &prompt).await?);
        }

        Ok(chapters.join("\n\n"))
    }
}
