// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//
use std::path::Path;
use std::time::Duration;

/// Extracts a displayable file name from a path, returning a fallback if the name is unreadable.
pub fn filename_display(path: &Path) -> &str {
    path.file_name()
        .and_then(|f| f.to_str())
        .unwrap_or("unreadable file name")
}

/// Outputs the given duration as hours:minutes:seconds, dropping the hours when there are none.
pub fn duration_display(duration: Duration) -> String {
    let total = duration.as_secs();
    let (hours, minutes, seconds) = (total / 3600, total / 60 % 60, total % 60);
    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{}:{:02}", minutes, seconds)
    }
}

#[cfg(test)]
mod test {
    use std::path::Path;
    use std::time::Duration;

    use super::{duration_display, filename_display};

    #[test]
    fn test_duration_display() {
        assert_eq!("0:00", duration_display(Duration::ZERO));
        assert_eq!("0:45", duration_display(Duration::from_millis(45_900)));
        assert_eq!("15:00", duration_display(Duration::from_secs(900)));
        assert_eq!("59:59", duration_display(Duration::from_secs(3599)));
        assert_eq!("1:00:00", duration_display(Duration::from_secs(3600)));
        assert_eq!("8:05:09", duration_display(Duration::from_secs(29_109)));
    }

    #[test]
    fn test_filename_display() {
        assert_eq!(
            "rain.ogg",
            filename_display(Path::new("audio/nature/rain.ogg"))
        );
        assert_eq!("unreadable file name", filename_display(Path::new("/")));
    }
}
