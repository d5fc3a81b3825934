//! 数据模型模块
//! 用户、角色、权限及其关联

pub mod permission;
pub mod role;
pub mod user;

use serde::{de, Deserialize, Deserializer};

/// 请求体中的整数 ID，同时接受数字和数字字符串（"3"）
#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrText {
    Number(i64),
    Text(String),
}

impl NumberOrText {
    fn into_int<T, E>(self) -> Result<T, E>
    where
        T: TryFrom<i64>,
        E: de::Error,
    {
        let value = match self {
            NumberOrText::Number(n) => n,
            NumberOrText::Text(text) => text
                .trim()
                .parse::<i64>()
                .map_err(|_| E::custom(format!("expected an integer, got {:?}", text)))?,
        };
        T::try_from(value).map_err(|_| E::custom(format!("integer out of range: {}", value)))
    }
}

pub(crate) fn optional_int<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: TryFrom<i64>,
{
    Option::<NumberOrText>::deserialize(deserializer)?
        .map(NumberOrText::into_int)
        .transpose()
}

pub(crate) fn int_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: TryFrom<i64>,
{
    Vec::<NumberOrText>::deserialize(deserializer)?
        .into_iter()
        .map(NumberOrText::into_int)
        .collect()
}
