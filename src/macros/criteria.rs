/// Build a [`Criteria`](crate::query::Criteria) map, keeping key order.
///
/// ```
/// use buoy::criteria;
/// use buoy::value::Value;
///
/// let criteria = criteria! {
///     "status" => 1,
///     "age :gt" => 18,
///     "deleted_at" => Value::Null,
/// };
/// let keys: Vec<&str> = criteria.keys().collect();
/// assert_eq!(keys, vec!["status", "age :gt", "deleted_at"]);
/// ```
#[macro_export]
macro_rules! criteria {
    () => {
        $crate::query::Criteria::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut criteria = $crate::query::Criteria::new();
        $(
            criteria.insert($key, $crate::value::Value::from($value));
        )+
        criteria
    }};
}

#[cfg(test)]
mod tests {
    use crate::value::Value;

    #[test]
    fn test_criteria_macro() {
        let empty = criteria!();
        assert!(empty.is_empty());

        let c = criteria! { "a" => 1, "b" => "x", "a" => 2 };
        assert_eq!(c.len(), 2);
        assert_eq!(c.get("a"), Some(&Value::Int(2)));
        assert_eq!(c.keys().collect::<Vec<_>>(), vec!["a", "b"]);
    }
}
