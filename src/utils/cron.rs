pub fn build_cron_expr(seconds: u64) -> (String, String) {
    let desc = if seconds < 60 {
        format!("every {} seconds", seconds)
    } else if seconds % 60 == 0 {
        format!("every {} minutes", seconds / 60)
    } else {
        format!("every {} minutes {} seconds", seconds / 60, seconds % 60)
    };

    let expr = if seconds < 60 {
        format!("*/{} * * * * *", seconds)
    } else {
        format!("0 */{} * * * *", seconds / 60)
    };

    (desc, expr)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sub_minute_schedules_use_the_seconds_field() {
        let (desc, expr) = build_cron_expr(30);
        assert_eq!(desc, "every 30 seconds");
        assert_eq!(expr, "*/30 * * * * *");
    }

    #[test]
    fn whole_minute_schedules_use_the_minutes_field() {
        let (desc, expr) = build_cron_expr(300);
        assert_eq!(desc, "every 5 minutes");
        assert_eq!(expr, "0 */5 * * * *");
    }
}
