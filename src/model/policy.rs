/// Mass-assignment gate shared by every attribute write.
///
/// `id` is always writable. A key listed in `fillable` is writable. Otherwise a key
/// listed in `guarded`, or any key when `guarded` contains `*`, is rejected. What
/// remains is writable only when `fillable` is empty.
#[must_use]
pub fn is_fillable(fillable: &[&str], guarded: &[&str], key: &str) -> bool {
    if key == "id" || fillable.contains(&key) {
        return true;
    }
    if guarded.contains(&"*") || guarded.contains(&key) {
        return false;
    }
    fillable.is_empty()
}
