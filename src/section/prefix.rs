//! Table-name prefix helpers.

/// Text before the first `_`, or the whole name when there is none
pub fn first_prefix(name: &str) -> &str {
    name.split('_').next().unwrap_or(name)
}

/// First two `_`-separated tokens, or the whole name when it has fewer
pub fn second_prefix(name: &str) -> &str {
    match name.find('_') {
        Some(first) => match name[first + 1..].find('_') {
            Some(second) => &name[..first + 1 + second],
            None => name,
        },
        None => name,
    }
}

/// Whether every name shares one prefix under `key`
pub fn shared_prefix<'n>(names: &[&'n str], key: fn(&str) -> &str) -> Option<&'n str> {
    let (&first, rest) = names.split_first()?;
    let prefix = key(first);
    rest.iter().all(|&n| key(n) == prefix).then_some(prefix)
}

/// Prefix under `key` covering a strict majority of the names
pub fn majority_prefix<'n>(names: &[&'n str], key: fn(&str) -> &str) -> Option<&'n str> {
    let mut counts: Vec<(&'n str, usize)> = Vec::new();
    for &name in names {
        let prefix = key(name);
        match counts.iter_mut().find(|(p, _)| *p == prefix) {
            Some((_, count)) => *count += 1,
            None => counts.push((prefix, 1)),
        }
    }
    counts
        .into_iter()
        .find(|&(_, count)| count * 2 > names.len())
        .map(|(prefix, _)| prefix)
}
