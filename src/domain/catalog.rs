// ==========================================
// 学员档案系统 - 目录（Catalog）领域模型
// ==========================================
// 目录: 国家 / 城市 / 职业 / 职位类别 / 大学
// 唯一性: 按折叠后的名称（去空白、去重音、小写）在作用域内唯一
//   - 国家、职业、职位类别: 全局
//   - 城市、大学: 所属国家内
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CatalogKind {
    Country,
    City,
    Profession,
    JobTitleCategory,
    University,
}

impl CatalogKind {
    /// 对应的数据表
    pub fn table(&self) -> &'static str {
        match self {
            CatalogKind::Country => "countries",
            CatalogKind::City => "cities",
            CatalogKind::Profession => "professions",
            CatalogKind::JobTitleCategory => "job_title_categories",
            CatalogKind::University => "universities",
        }
    }

    /// 是否按所属国家限定作用域
    pub fn is_country_scoped(&self) -> bool {
        matches!(self, CatalogKind::City | CatalogKind::University)
    }
}

impl fmt::Display for CatalogKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CatalogKind::Country => "country",
            CatalogKind::City => "city",
            CatalogKind::Profession => "profession",
            CatalogKind::JobTitleCategory => "job_title_category",
            CatalogKind::University => "university",
        };
        f.write_str(name)
    }
}

// ==========================================
// NewCatalogEntry - 新建目录项
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCatalogEntry {
    pub name: String,
    /// 城市/大学的所属国家
    pub country_id: Option<Uuid>,
    /// 仅大学使用
    pub city_id: Option<Uuid>,
}

impl NewCatalogEntry {
    pub fn global(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            country_id: None,
            city_id: None,
        }
    }

    pub fn scoped(name: impl Into<String>, country_id: Uuid) -> Self {
        Self {
            name: name.into(),
            country_id: Some(country_id),
            city_id: None,
        }
    }
}

/// 国家代码: 去空白后取前三个字符并转大写
///
/// 代码冲突（如 Colombia / Colorado）由存储层唯一约束暴露，此处不处理
pub fn derive_country_code(name: &str) -> String {
    name.trim().chars().take(3).collect::<String>().to_uppercase()
}

/// 目录名称的比较键: 去空白、折叠重音、小写
///
/// 存储层以该键做作用域内唯一约束与查找
pub fn catalog_name_key(name: &str) -> String {
    name.trim().to_lowercase().chars().map(fold_accent).collect()
}

/// 单字符去重音（输入已小写）
///
/// 覆盖拉丁字母扩展 A 区的常见字母；合字（æ、œ、ß）与非拉丁文字不折叠
fn fold_accent(c: char) -> char {
    match c {
        'á' | 'à' | 'â' | 'ä' | 'ã' | 'å' | 'ā' | 'ă' | 'ą' => 'a',
        'ç' | 'ć' | 'ĉ' | 'ċ' | 'č' => 'c',
        'ď' | 'đ' => 'd',
        'é' | 'è' | 'ê' | 'ë' | 'ē' | 'ĕ' | 'ė' | 'ę' | 'ě' => 'e',
        'ĝ' | 'ğ' | 'ġ' | 'ģ' => 'g',
        'ĥ' | 'ħ' => 'h',
        'í' | 'ì' | 'î' | 'ï' | 'ĩ' | 'ī' | 'ĭ' | 'į' | 'ı' => 'i',
        'ĵ' => 'j',
        'ķ' => 'k',
        'ĺ' | 'ļ' | 'ľ' | 'ŀ' | 'ł' => 'l',
        'ñ' | 'ń' | 'ņ' | 'ň' => 'n',
        'ó' | 'ò' | 'ô' | 'ö' | 'õ' | 'ø' | 'ō' | 'ŏ' | 'ő' => 'o',
        'ŕ' | 'ŗ' | 'ř' => 'r',
        'ś' | 'ŝ' | 'ş' | 'š' | 'ș' => 's',
        'ţ' | 'ť' | 'ŧ' | 'ț' => 't',
        'ú' | 'ù' | 'û' | 'ü' | 'ũ' | 'ū' | 'ŭ' | 'ů' | 'ű' | 'ų' => 'u',
        'ŵ' => 'w',
        'ý' | 'ÿ' | 'ŷ' => 'y',
        'ź' | 'ż' | 'ž' => 'z',
        other => other,
    }
}
