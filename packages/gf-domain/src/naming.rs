/// `first [middle] last`, skipping a blank middle name.
pub fn full_name(first: &str, middle: Option<&str>, last: &str) -> String {
	match middle.map(str::trim).filter(|middle| !middle.is_empty()) {
		Some(middle) => format!("{} {middle} {}", first.trim(), last.trim()),
		None => format!("{} {}", first.trim(), last.trim()),
	}
}

/// Lowercase ASCII slug: alphanumerics kept, runs of anything else collapsed to one `-`.
pub fn slugify(text: &str) -> String {
	let mut slug = String::with_capacity(text.len());
	let mut pending_dash = false;

	for ch in text.chars() {
		if ch.is_ascii_alphanumeric() {
			if pending_dash && !slug.is_empty() {
				slug.push('-');
			}

			pending_dash = false;

			slug.push(ch.to_ascii_lowercase());
		} else {
			pending_dash = true;
		}
	}

	slug
}

/// A state's lookup key defaults to the first 100 characters of its name.
pub fn default_state_key(name: &str) -> String {
	name.trim().chars().take(100).collect()
}
