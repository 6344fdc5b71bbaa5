use anyhow::Result;
use std::io::Write;
use std::net::TcpStream;

use crate::common::read_lines;

pub fn smtp_handshake(smtp: &mut TcpStream) -> Result<()> {
    let mut buffer: [u8; 1500] = [0; 1500];

    let _read = read_lines(smtp, &mut buffer, None)?;
    assert_eq!(&buffer[..4], &b"220 "[..]);

    smtp.write(&b"EHLO example.tld\r\n"[..])?;
    let _read = read_lines(smtp, &mut buffer, Some(&b"250 "[..]))?;

    Ok(())
}

pub fn smtp_starttls_refused(smtp: &mut TcpStream) -> Result<()> {
    let mut buffer: [u8; 1500] = [0; 1500];

    smtp.write(&b"STARTTLS\r\n"[..])?;
    let read = read_lines(smtp, &mut buffer, None)?;
    assert_eq!(read[0], b'5', "STARTTLS must be refused");

    Ok(())
}

pub fn smtp_deliver_email(smtp: &mut TcpStream, rcpt: &str, email: &[u8]) -> Result<()> {
    let mut buffer: [u8; 1500] = [0; 1500];

    smtp.write(&b"MAIL FROM:<bob@example.tld>\r\n"[..])?;
    let _read = read_lines(smtp, &mut buffer, Some(&b"250 "[..]))?;

    smtp.write(format!("RCPT TO:{}\r\n", rcpt).as_bytes())?;
    let _read = read_lines(smtp, &mut buffer, Some(&b"250 "[..]))?;

    smtp.write(&b"DATA\r\n"[..])?;
    let _read = read_lines(smtp, &mut buffer, Some(&b"354 "[..]))?;

    smtp.write(email)?;
    smtp.write(&b"\r\n.\r\n"[..])?;
    let _read = read_lines(smtp, &mut buffer, Some(&b"250 "[..]))?;

    Ok(())
}

pub fn smtp_quit(smtp: &mut TcpStream) -> Result<()> {
    let mut buffer: [u8; 1500] = [0; 1500];

    smtp.write(&b"QUIT\r\n"[..])?;
    let _read = read_lines(smtp, &mut buffer, Some(&b"221 "[..]))?;

    Ok(())
}
