/// Joins items into an English list with a comma after every item but the last and
/// `and` before the final item: `A`, `A, and B`, `A, B, and C`.
pub fn join_with_and<S>(items: &[S]) -> String
where
    S: AsRef<str>,
{
    let last_index = items.len().saturating_sub(1);
    let mut joined = String::new();

    for (index, item) in items.iter().enumerate() {
        if index == last_index && index > 0 {
            joined.push_str("and ");
        }
        joined.push_str(item.as_ref());
        if index < last_index {
            joined.push_str(", ");
        }
    }

    joined
}
