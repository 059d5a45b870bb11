use crate::model::Entity;

pub fn filter_by_name<'a, I>(entities: I, query: &str) -> Vec<&'a Entity>
where
    I: IntoIterator<Item = &'a Entity>,
{
    if query.trim().is_empty() {
        return entities.into_iter().collect();
    }

    let needle = query.to_lowercase();
    entities
        .into_iter()
        .filter(|entity| entity.name().to_lowercase().contains(&needle))
        .collect()
}
