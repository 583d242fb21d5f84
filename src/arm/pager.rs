//! List Pagination
//!
//! ARM list operations return `{"value": [...], "nextLink": "..."}`. The
//! pager follows `nextLink` verbatim until it is absent or empty.

use super::client::ArmClient;
use anyhow::{Context, Result};
use futures::stream::{self, Stream, TryStreamExt};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashSet;
use std::marker::PhantomData;

/// One page of a list response
#[derive(Debug, Deserialize)]
pub struct Page<T> {
    #[serde(default = "Vec::new")]
    pub value: Vec<T>,
    #[serde(rename = "nextLink", default)]
    pub next_link: Option<String>,
}

/// Client-side filter applied while collecting
pub trait Predicate<T> {
    fn matches(&self, item: &T) -> bool;
}

impl<T, F> Predicate<T> for F
where
    F: Fn(&T) -> bool,
{
    fn matches(&self, item: &T) -> bool {
        self(item)
    }
}

/// Common top-level fields of an ARM resource
pub trait ArmResource {
    fn resource_id(&self) -> Option<&str>;
    fn resource_name(&self) -> Option<&str>;
    fn resource_type(&self) -> Option<&str>;
}

/// Implement [`ArmResource`] for models with `id`, `name` and `type_` fields
#[macro_export]
macro_rules! impl_arm_resource {
    ($($model:ty),+ $(,)?) => {
        $(
            impl $crate::arm::pager::ArmResource for $model {
                fn resource_id(&self) -> Option<&str> {
                    self.id.as_deref()
                }

                fn resource_name(&self) -> Option<&str> {
                    self.name.as_deref()
                }

                fn resource_type(&self) -> Option<&str> {
                    self.type_.as_deref()
                }
            }
        )+
    };
}

/// Exact match on whichever of `id`, `name` and `type` are set
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourcePredicate {
    pub id: Option<String>,
    pub name: Option<String>,
    pub type_: Option<String>,
}

impl ResourcePredicate {
    pub fn with_name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }
}

impl<T: ArmResource> Predicate<T> for ResourcePredicate {
    fn matches(&self, item: &T) -> bool {
        fn field_matches(wanted: &Option<String>, actual: Option<&str>) -> bool {
            match wanted {
                Some(wanted) => actual == Some(wanted.as_str()),
                None => true,
            }
        }

        field_matches(&self.id, item.resource_id())
            && field_matches(&self.name, item.resource_name())
            && field_matches(&self.type_, item.resource_type())
    }
}

/// Iterates a paged list response
pub struct Pager<T> {
    client: ArmClient,
    next: Option<String>,
    visited: HashSet<String>,
    pages: usize,
    _marker: PhantomData<fn() -> T>,
}

impl<T: DeserializeOwned> Pager<T> {
    pub(crate) fn new(client: ArmClient, first_url: String) -> Self {
        Self {
            client,
            next: Some(first_url),
            visited: HashSet::new(),
            pages: 0,
            _marker: PhantomData,
        }
    }

    /// Pages fetched so far
    pub fn pages_fetched(&self) -> usize {
        self.pages
    }

    pub fn has_more(&self) -> bool {
        self.next.is_some()
    }

    /// Fetch the next page; `None` once the list is exhausted
    pub async fn next_page(&mut self) -> Result<Option<Vec<T>>> {
        let Some(url) = self.next.take() else {
            return Ok(None);
        };

        if !self.visited.insert(url.clone()) {
            return Err(anyhow::anyhow!(
                "nextLink {} was already visited, refusing to loop",
                url
            ));
        }

        let response = self.client.send(Method::GET, &url, None).await?;
        let page: Page<T> = serde_json::from_value(response.body)
            .context("failure responding to request: decoding list page")?;

        self.pages += 1;
        self.next = page.next_link.filter(|link| !link.trim().is_empty());

        tracing::debug!(
            "page {} returned {} items, more: {}",
            self.pages,
            page.value.len(),
            self.next.is_some()
        );

        Ok(Some(page.value))
    }

    /// Fetch every page and concatenate the items in order
    pub async fn collect_all(self) -> Result<Vec<T>> {
        self.collect_matching(|_: &T| true).await
    }

    /// Fetch every page, keeping items the predicate accepts
    pub async fn collect_matching<P: Predicate<T>>(mut self, predicate: P) -> Result<Vec<T>> {
        let mut all_items = Vec::new();

        while let Some(items) = self.next_page().await? {
            all_items.extend(items.into_iter().filter(|item| predicate.matches(item)));
        }

        Ok(all_items)
    }

    /// Items as a stream, fetching pages lazily
    pub fn into_stream(self) -> impl Stream<Item = Result<T>>
    where
        T: 'static,
    {
        stream::try_unfold(self, |mut pager| async move {
            match pager.next_page().await? {
                Some(items) => {
                    let page = stream::iter(items.into_iter().map(Ok::<T, anyhow::Error>));
                    Ok::<_, anyhow::Error>(Some((page, pager)))
                },
                None => Ok(None),
            }
        })
        .try_flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Deserialize)]
    struct Thing {
        id: Option<String>,
        name: Option<String>,
        #[serde(rename = "type")]
        type_: Option<String>,
    }

    crate::impl_arm_resource!(Thing);

    fn thing(name: &str) -> Thing {
        Thing {
            id: Some(format!("/things/{}", name)),
            name: Some(name.to_string()),
            type_: Some("Example/things".to_string()),
        }
    }

    #[test]
    fn test_page_decodes_without_next_link() {
        let page: Page<Thing> = serde_json::from_value(json!({"value": [{"name": "a"}]})).unwrap();
        assert_eq!(page.value.len(), 1);
        assert!(page.next_link.is_none());

        let empty: Page<Thing> = serde_json::from_value(json!({})).unwrap();
        assert!(empty.value.is_empty());
    }

    #[test]
    fn test_resource_predicate() {
        let predicate = ResourcePredicate::with_name("a");
        assert!(predicate.matches(&thing("a")));
        assert!(!predicate.matches(&thing("b")));

        let by_type = ResourcePredicate {
            type_: Some("Example/things".to_string()),
            ..Default::default()
        };
        assert!(by_type.matches(&thing("b")));

        assert!(ResourcePredicate::default().matches(&thing("z")));
    }

    #[test]
    fn test_closure_predicate() {
        let long_names = |t: &Thing| t.name.as_deref().map(|n| n.len() > 1).unwrap_or(false);
        assert!(long_names.matches(&thing("ab")));
        assert!(!long_names.matches(&thing("a")));
    }
}
