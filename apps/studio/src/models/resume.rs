use std::collections::HashSet;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Invariant violations of a résumé document.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ModelError {
    #[error("duplicate id '{0}' in document")]
    DuplicateId(String),

    #[error("module '{module_id}' of type {kind:?} contains a mismatched item at index {index}")]
    MixedContent {
        module_id: String,
        kind: ModuleType,
        index: usize,
    },

    #[error("module '{0}' not found")]
    ModuleNotFound(String),

    #[error("item '{0}' not found")]
    ItemNotFound(String),

    #[error("index {index} out of range for length {len}")]
    OutOfRange { index: usize, len: usize },
}

// ────────────────────────────────────────────────────────────────────────────
// Settings
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum FontFamily {
    #[default]
    SansSerif,
    Serif,
    Monospace,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PageMargin {
    Compact,
    #[default]
    Normal,
    Wide,
}

impl PageMargin {
    /// Page padding in CSS pixels.
    pub fn px(self) -> f32 {
        match self {
            PageMargin::Compact => 24.0,
            PageMargin::Normal => 40.0,
            PageMargin::Wide => 56.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Language {
    #[default]
    #[serde(rename = "zh-CN")]
    Zh,
    #[serde(rename = "en-US")]
    En,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResumeSettings {
    pub theme_color: String,
    pub font_family: FontFamily,
    pub font_size_scale: f32,
    pub line_height: f32,
    pub page_margin: PageMargin,
    pub language: Language,
}

impl Default for ResumeSettings {
    fn default() -> Self {
        Self {
            theme_color: "#2563eb".to_string(),
            font_family: FontFamily::default(),
            font_size_scale: 1.0,
            line_height: 1.5,
            page_margin: PageMargin::default(),
            language: Language::default(),
        }
    }
}

impl ResumeSettings {
    /// Font-size multiplier, falling back to 1 for non-positive or non-finite values.
    pub fn scale(&self) -> f32 {
        if self.font_size_scale.is_finite() && self.font_size_scale > 0.0 {
            self.font_size_scale
        } else {
            1.0
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Profile
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomField {
    pub id: String,
    pub label: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default)]
    pub custom_fields: Vec<CustomField>,
}

/// Returns the trimmed value when present and non-blank.
pub fn non_blank(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

impl Profile {
    /// Contact lines in display order, omitting absent fields.
    pub fn contact_fields(&self) -> Vec<(&'static str, &str)> {
        [
            ("email", &self.email),
            ("phone", &self.phone),
            ("location", &self.location),
            ("website", &self.website),
            ("github", &self.github),
        ]
        .into_iter()
        .filter_map(|(key, value)| non_blank(value).map(|v| (key, v)))
        .collect()
    }

    /// Custom fields whose label and value are both non-blank.
    pub fn visible_custom_fields(&self) -> impl Iterator<Item = &CustomField> {
        self.custom_fields
            .iter()
            .filter(|f| !f.label.trim().is_empty() && !f.value.trim().is_empty())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Modules and items
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModuleType {
    Experience,
    Education,
    Projects,
    Skills,
    Custom,
}

impl ModuleType {
    /// Default Chinese section title used when a module is created.
    pub fn default_title(self) -> &'static str {
        match self {
            ModuleType::Experience => "工作经历",
            ModuleType::Education => "教育经历",
            ModuleType::Projects => "项目经历",
            ModuleType::Skills => "专业技能",
            ModuleType::Custom => "自定义模块",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillItem {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResumeItem {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// One entry of a module. The JSON carries no tag: an object with `title` is an
/// entry, an object with only `name` is a skill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ModuleItem {
    Entry(ResumeItem),
    Skill(SkillItem),
}

impl ModuleItem {
    pub fn id(&self) -> &str {
        match self {
            ModuleItem::Entry(item) => &item.id,
            ModuleItem::Skill(item) => &item.id,
        }
    }

    fn with_id(mut self, id: String) -> Self {
        match &mut self {
            ModuleItem::Entry(item) => item.id = id,
            ModuleItem::Skill(item) => item.id = id,
        }
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Module {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ModuleType,
    pub title: String,
    #[serde(default = "default_visible")]
    pub visible: bool,
    #[serde(default)]
    pub items: Vec<ModuleItem>,
}

fn default_visible() -> bool {
    true
}

/// True when the module holds skill tags. Decided by the module type alone.
pub fn is_skills_module(module: &Module) -> bool {
    module.kind == ModuleType::Skills
}

impl Module {
    pub fn new(kind: ModuleType) -> Self {
        Self {
            id: new_id(),
            kind,
            title: kind.default_title().to_string(),
            visible: true,
            items: Vec::new(),
        }
    }

    /// Verifies that every item matches the shape implied by `kind`.
    pub fn check(&self) -> Result<(), ModelError> {
        let skills = is_skills_module(self);
        for (index, item) in self.items.iter().enumerate() {
            let matches = matches!(
                (skills, item),
                (true, ModuleItem::Skill(_)) | (false, ModuleItem::Entry(_))
            );
            if !matches {
                return Err(ModelError::MixedContent {
                    module_id: self.id.clone(),
                    kind: self.kind,
                    index,
                });
            }
        }
        Ok(())
    }

    /// A blank item of the right shape for this module.
    pub fn blank_item(&self) -> ModuleItem {
        if is_skills_module(self) {
            ModuleItem::Skill(SkillItem {
                id: new_id(),
                name: String::new(),
            })
        } else {
            ModuleItem::Entry(ResumeItem {
                id: new_id(),
                title: String::new(),
                subtitle: None,
                date: None,
                location: None,
                description: None,
            })
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Document
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumeData {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub last_modified: i64,
    #[serde(default = "default_template")]
    pub template: String,
    #[serde(default)]
    pub settings: ResumeSettings,
    pub profile: Profile,
    #[serde(default)]
    pub modules: Vec<Module>,
}

fn default_template() -> String {
    "classic".to_string()
}

pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

impl ResumeData {
    /// Checks id uniqueness across modules and items and item homogeneity.
    pub fn check(&self) -> Result<(), ModelError> {
        let mut seen = HashSet::new();
        for module in &self.modules {
            if !seen.insert(module.id.as_str()) {
                return Err(ModelError::DuplicateId(module.id.clone()));
            }
            module.check()?;
            for item in &module.items {
                if !seen.insert(item.id()) {
                    return Err(ModelError::DuplicateId(item.id().to_string()));
                }
            }
        }
        Ok(())
    }

    fn module_index(&self, module_id: &str) -> Result<usize, ModelError> {
        self.modules
            .iter()
            .position(|m| m.id == module_id)
            .ok_or_else(|| ModelError::ModuleNotFound(module_id.to_string()))
    }

    fn touched(mut self) -> Self {
        self.last_modified = now_millis();
        self
    }

    // Every mutation below consumes a copy and returns the next snapshot.

    pub fn with_title(&self, title: impl Into<String>) -> Self {
        let mut next = self.clone();
        next.title = title.into();
        next.touched()
    }

    pub fn with_profile(&self, profile: Profile) -> Self {
        let mut next = self.clone();
        next.profile = profile;
        next.touched()
    }

    pub fn with_settings(&self, settings: ResumeSettings) -> Self {
        let mut next = self.clone();
        next.settings = settings;
        next.touched()
    }

    pub fn with_template(&self, template: impl Into<String>) -> Self {
        let mut next = self.clone();
        next.template = template.into();
        next.touched()
    }

    pub fn add_module(&self, kind: ModuleType) -> Self {
        let mut next = self.clone();
        next.modules.push(Module::new(kind));
        next.touched()
    }

    pub fn remove_module(&self, module_id: &str) -> Result<Self, ModelError> {
        let index = self.module_index(module_id)?;
        let mut next = self.clone();
        next.modules.remove(index);
        Ok(next.touched())
    }

    pub fn move_module(&self, module_id: &str, to: usize) -> Result<Self, ModelError> {
        let from = self.module_index(module_id)?;
        let mut next = self.clone();
        move_within(&mut next.modules, from, to)?;
        Ok(next.touched())
    }

    pub fn toggle_module(&self, module_id: &str) -> Result<Self, ModelError> {
        let index = self.module_index(module_id)?;
        let mut next = self.clone();
        next.modules[index].visible = !next.modules[index].visible;
        Ok(next.touched())
    }

    /// Appends `item` (or a blank item of the right shape) to a module.
    pub fn add_item(&self, module_id: &str, item: Option<ModuleItem>) -> Result<Self, ModelError> {
        let index = self.module_index(module_id)?;
        let mut next = self.clone();
        let module = &mut next.modules[index];
        let item = item.unwrap_or_else(|| module.blank_item());
        module.items.push(item);
        module.check()?;
        next.check()?;
        Ok(next.touched())
    }

    pub fn remove_item(&self, module_id: &str, item_id: &str) -> Result<Self, ModelError> {
        let index = self.module_index(module_id)?;
        let mut next = self.clone();
        let items = &mut next.modules[index].items;
        let pos = items
            .iter()
            .position(|i| i.id() == item_id)
            .ok_or_else(|| ModelError::ItemNotFound(item_id.to_string()))?;
        items.remove(pos);
        Ok(next.touched())
    }

    pub fn move_item(&self, module_id: &str, item_id: &str, to: usize) -> Result<Self, ModelError> {
        let index = self.module_index(module_id)?;
        let mut next = self.clone();
        let items = &mut next.modules[index].items;
        let from = items
            .iter()
            .position(|i| i.id() == item_id)
            .ok_or_else(|| ModelError::ItemNotFound(item_id.to_string()))?;
        move_within(items, from, to)?;
        Ok(next.touched())
    }

    /// A copy with fresh document, module and item ids.
    pub fn duplicate(&self, title: impl Into<String>) -> Self {
        let mut next = self.reissue_ids();
        next.title = title.into();
        next.touched()
    }

    /// Replaces every id in the document with a freshly generated one.
    pub fn reissue_ids(&self) -> Self {
        let mut next = self.clone();
        next.id = new_id();
        for module in &mut next.modules {
            module.id = new_id();
            module.items = std::mem::take(&mut module.items)
                .into_iter()
                .map(|item| item.with_id(new_id()))
                .collect();
        }
        next
    }

    pub fn visible_modules(&self) -> impl Iterator<Item = &Module> {
        self.modules.iter().filter(|m| m.visible)
    }
}

fn move_within<T>(items: &mut Vec<T>, from: usize, to: usize) -> Result<(), ModelError> {
    if to >= items.len() {
        return Err(ModelError::OutOfRange {
            index: to,
            len: items.len(),
        });
    }
    let item = items.remove(from);
    items.insert(to, item);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::presets::engineer_sample;

    fn skills_module() -> Module {
        Module {
            id: "m-skills".into(),
            kind: ModuleType::Skills,
            title: "专业技能".into(),
            visible: true,
            items: vec![ModuleItem::Skill(SkillItem {
                id: "s1".into(),
                name: "Rust".into(),
            })],
        }
    }

    #[test]
    fn test_is_skills_module_uses_type_only() {
        let mut module = skills_module();
        assert!(is_skills_module(&module));
        module.kind = ModuleType::Custom;
        assert!(!is_skills_module(&module));
    }

    #[test]
    fn test_mixed_content_detected() {
        let mut module = skills_module();
        module.items.push(ModuleItem::Entry(ResumeItem {
            id: "e1".into(),
            title: "Oops".into(),
            subtitle: None,
            date: None,
            location: None,
            description: None,
        }));
        let err = module.check().unwrap_err();
        assert!(matches!(err, ModelError::MixedContent { index: 1, .. }));
    }

    #[test]
    fn test_untagged_items_deserialize_by_shape() {
        let json = r#"{"id":"m1","type":"skills","title":"技能","visible":true,
            "items":[{"id":"a","name":"Go"}]}"#;
        let module: Module = serde_json::from_str(json).unwrap();
        assert!(matches!(module.items[0], ModuleItem::Skill(_)));
        assert!(module.check().is_ok());

        let json = r#"{"id":"m2","type":"experience","title":"经历",
            "items":[{"id":"b","title":"Acme","date":"2020"}]}"#;
        let module: Module = serde_json::from_str(json).unwrap();
        assert!(module.visible);
        assert!(matches!(module.items[0], ModuleItem::Entry(_)));
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let mut doc = engineer_sample();
        let dup = doc.modules[0].id.clone();
        doc.modules[1].id = dup.clone();
        assert_eq!(doc.check(), Err(ModelError::DuplicateId(dup)));
    }

    #[test]
    fn test_mutations_do_not_touch_previous_snapshot() {
        let doc = engineer_sample();
        let first = doc.modules[0].id.clone();
        let next = doc.toggle_module(&first).unwrap();
        assert!(doc.modules[0].visible);
        assert!(!next.modules[0].visible);
    }

    #[test]
    fn test_move_module_and_item_preserve_others() {
        let doc = engineer_sample();
        let last = doc.modules.last().unwrap().id.clone();
        let moved = doc.move_module(&last, 0).unwrap();
        assert_eq!(moved.modules[0].id, last);
        assert_eq!(moved.modules.len(), doc.modules.len());

        let module = &doc.modules[0];
        let item_ids: Vec<_> = module.items.iter().map(|i| i.id().to_string()).collect();
        if item_ids.len() >= 2 {
            let moved = doc.move_item(&module.id, &item_ids[1], 0).unwrap();
            assert_eq!(moved.modules[0].items[0].id(), item_ids[1]);
        }
        assert!(matches!(
            doc.move_module(&last, 99),
            Err(ModelError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_add_item_rejects_wrong_shape() {
        let doc = engineer_sample();
        let skills = doc
            .modules
            .iter()
            .find(|m| is_skills_module(m))
            .unwrap()
            .id
            .clone();
        let wrong = ModuleItem::Entry(ResumeItem {
            id: new_id(),
            title: "x".into(),
            subtitle: None,
            date: None,
            location: None,
            description: None,
        });
        assert!(doc.add_item(&skills, Some(wrong)).is_err());
        let blank = doc.add_item(&skills, None).unwrap();
        assert!(blank.check().is_ok());
    }

    #[test]
    fn test_duplicate_reissues_all_ids() {
        let doc = engineer_sample();
        let copy = doc.duplicate("副本");
        assert_ne!(copy.id, doc.id);
        for (a, b) in copy.modules.iter().zip(doc.modules.iter()) {
            assert_ne!(a.id, b.id);
            assert_eq!(a.items.len(), b.items.len());
        }
        assert!(copy.check().is_ok());
    }

    #[test]
    fn test_scale_falls_back_for_invalid_values() {
        let mut settings = ResumeSettings::default();
        settings.font_size_scale = 0.0;
        assert_eq!(settings.scale(), 1.0);
        settings.font_size_scale = 1.2;
        assert_eq!(settings.scale(), 1.2);
    }

    #[test]
    fn test_contact_fields_skip_blank() {
        let profile = Profile {
            name: "李明".into(),
            email: Some("a@b.com".into()),
            phone: Some("   ".into()),
            ..Default::default()
        };
        assert_eq!(profile.contact_fields(), vec![("email", "a@b.com")]);
    }
}
