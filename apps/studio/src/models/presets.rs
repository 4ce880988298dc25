use serde::{Deserialize, Serialize};

use crate::models::resume::{
    new_id, now_millis, Module, ModuleItem, ModuleType, Profile, ResumeData, ResumeItem,
    ResumeSettings, SkillItem,
};
use crate::templates::TemplateKind;

/// A named starting point for a new document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preset {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub data: ResumeData,
}

impl Preset {
    /// Instantiates the preset as a new document with fresh ids.
    pub fn instantiate(&self, title: Option<&str>) -> ResumeData {
        let mut doc = self.data.reissue_ids();
        if let Some(title) = title {
            doc.title = title.to_string();
        }
        doc.last_modified = now_millis();
        doc
    }
}

/// An empty document with the four standard sections.
pub fn blank_document(title: &str) -> ResumeData {
    ResumeData {
        id: new_id(),
        title: title.to_string(),
        last_modified: now_millis(),
        template: TemplateKind::default().id().to_string(),
        settings: ResumeSettings::default(),
        profile: Profile::default(),
        modules: [
            ModuleType::Experience,
            ModuleType::Education,
            ModuleType::Projects,
            ModuleType::Skills,
        ]
        .into_iter()
        .map(Module::new)
        .collect(),
    }
}

fn entry(
    title: &str,
    subtitle: &str,
    date: &str,
    location: Option<&str>,
    description: &str,
) -> ModuleItem {
    ModuleItem::Entry(ResumeItem {
        id: new_id(),
        title: title.to_string(),
        subtitle: Some(subtitle.to_string()),
        date: Some(date.to_string()),
        location: location.map(str::to_string),
        description: Some(description.to_string()),
    })
}

fn skill(name: &str) -> ModuleItem {
    ModuleItem::Skill(SkillItem {
        id: new_id(),
        name: name.to_string(),
    })
}

fn module(kind: ModuleType, items: Vec<ModuleItem>) -> Module {
    Module {
        items,
        ..Module::new(kind)
    }
}

pub fn engineer_sample() -> ResumeData {
    ResumeData {
        id: new_id(),
        title: "软件工程师简历".to_string(),
        last_modified: now_millis(),
        template: TemplateKind::Modern.id().to_string(),
        settings: ResumeSettings::default(),
        profile: Profile {
            name: "李明".to_string(),
            title: Some("高级后端工程师".to_string()),
            email: Some("liming@example.com".to_string()),
            phone: Some("13800138000".to_string()),
            location: Some("上海".to_string()),
            github: Some("github.com/liming".to_string()),
            summary: Some("8 年服务端开发经验，专注于分布式存储与高并发系统。".to_string()),
            ..Default::default()
        },
        modules: vec![
            module(
                ModuleType::Experience,
                vec![
                    entry(
                        "星河科技",
                        "高级后端工程师",
                        "2020.03 - 至今",
                        Some("上海"),
                        "负责订单系统重构，峰值 QPS 提升 3 倍\n主导存储层迁移，成本下降 40%",
                    ),
                    entry(
                        "云帆网络",
                        "后端工程师",
                        "2016.07 - 2020.02",
                        Some("杭州"),
                        "设计并实现消息推送服务，日均推送 2000 万条",
                    ),
                ],
            ),
            module(
                ModuleType::Education,
                vec![entry(
                    "浙江大学",
                    "计算机科学与技术 · 本科",
                    "2012.09 - 2016.06",
                    None,
                    "GPA 3.8/4.0",
                )],
            ),
            module(
                ModuleType::Projects,
                vec![entry(
                    "分布式缓存网关",
                    "技术负责人",
                    "2021.05 - 2022.01",
                    None,
                    "统一多集群缓存访问，P99 延迟降低 35%",
                )],
            ),
            module(
                ModuleType::Skills,
                vec![skill("Rust"), skill("Go"), skill("PostgreSQL"), skill("Kubernetes")],
            ),
        ],
    }
}

pub fn student_sample() -> ResumeData {
    ResumeData {
        id: new_id(),
        title: "应届生简历".to_string(),
        last_modified: now_millis(),
        template: TemplateKind::Academic.id().to_string(),
        settings: ResumeSettings::default(),
        profile: Profile {
            name: "王芳".to_string(),
            email: Some("wangfang@example.com".to_string()),
            summary: Some("对机器学习系统有浓厚兴趣，具备扎实的数学基础。".to_string()),
            ..Default::default()
        },
        modules: vec![
            module(
                ModuleType::Education,
                vec![entry(
                    "复旦大学",
                    "数据科学 · 硕士",
                    "2023.09 - 2026.06",
                    Some("上海"),
                    "研究方向：图神经网络",
                )],
            ),
            module(
                ModuleType::Projects,
                vec![entry(
                    "课程推荐系统",
                    "个人项目",
                    "2024.03 - 2024.06",
                    None,
                    "基于协同过滤的选课推荐，覆盖 1200 名学生",
                )],
            ),
            module(
                ModuleType::Skills,
                vec![skill("Python"), skill("PyTorch"), skill("SQL")],
            ),
        ],
    }
}

/// Built-in presets, always available without any file loading.
pub fn builtin_presets() -> Vec<Preset> {
    vec![
        Preset {
            id: "blank".to_string(),
            name: "空白简历".to_string(),
            description: "从零开始".to_string(),
            data: blank_document("我的简历"),
        },
        Preset {
            id: "engineer".to_string(),
            name: "工程师".to_string(),
            description: "适合有工作经验的技术岗位".to_string(),
            data: engineer_sample(),
        },
        Preset {
            id: "student".to_string(),
            name: "应届生".to_string(),
            description: "突出教育背景与项目".to_string(),
            data: student_sample(),
        },
    ]
}
