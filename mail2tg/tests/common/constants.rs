use std::time;

pub static SMALL_DELAY: time::Duration = time::Duration::from_millis(200);

pub static SMTP_ADDR: &str = "127.0.0.1:12525";

pub static WILDCARD_CHAT: i64 = 555001;
pub static OPS_CHAT: i64 = -100123;
pub static BROKEN_RCPT: &str = "broken@example.tld";

pub static EMAIL_PLAIN: &[u8] = b"Date: Sat, 8 Jul 2023 07:14:29 +0200\r
From: Bob Robert <bob@example.tld>\r
To: Reports <reports@example.com>\r
Subject: Daily\r
Content-Type: text/plain; charset=utf-8\r
\r
all good\r
";

pub static EMAIL_ALTERNATIVE: &[u8] = b"Date: Sat, 8 Jul 2023 07:14:29 +0200\r
From: Bob Robert <bob@example.tld>\r
To: Ops <ops@example.tld>\r
Subject: Nightly report\r
MIME-Version: 1.0\r
Content-Type: multipart/alternative;\r
 boundary=\"b1_e376dc71bafc953c0b0fdeb9983a9956\"\r
\r
This is a multi-part message in MIME format.\r
\r
--b1_e376dc71bafc953c0b0fdeb9983a9956\r
Content-Type: text/plain; charset=utf-8\r
\r
GZ, all builds passed\r
\r
--b1_e376dc71bafc953c0b0fdeb9983a9956\r
Content-Type: text/html; charset=us-ascii\r
Content-Transfer-Encoding: base64\r
\r
PGI+aGk8L2I+\r
\r
--b1_e376dc71bafc953c0b0fdeb9983a9956--\r
";

pub static EMAIL_NO_DELIMITER: &[u8] = b"From: Bob Robert <bob@example.tld>\r
Subject: Truncated\r
Content-Type: multipart/mixed; boundary=zz\r
\r
no delimiters here\r
";
